use crate::models::Coordinates;

/// Used when the requested country is not in the table.
pub const DEFAULT_CENTROID: (f64, f64) = (46.8182, 8.2275);

/// Approximate geographic centres, keyed by lowercase English and native
/// names.
const COUNTRY_CENTROIDS: &[(&[&str], (f64, f64))] = &[
    (&["france"], (46.2276, 2.2137)),
    (&["italy", "italia"], (41.8719, 12.5674)),
    (&["spain", "españa", "espana"], (40.4637, -3.7492)),
    (&["portugal"], (39.3999, -8.2245)),
    (&["germany", "deutschland"], (51.1657, 10.4515)),
    (&["switzerland", "schweiz", "suisse", "svizzera"], (46.8182, 8.2275)),
    (&["austria", "österreich", "osterreich"], (47.5162, 14.5501)),
    (&["belgium", "belgique", "belgië"], (50.5039, 4.4699)),
    (&["netherlands", "the netherlands", "nederland", "holland"], (52.1326, 5.2913)),
    (&["luxembourg"], (49.8153, 6.1296)),
    (&["united kingdom", "uk", "great britain", "england"], (55.3781, -3.4360)),
    (&["scotland"], (56.4907, -4.2026)),
    (&["ireland", "éire"], (53.4129, -8.2439)),
    (&["iceland", "ísland"], (64.9631, -19.0208)),
    (&["norway", "norge"], (60.4720, 8.4689)),
    (&["sweden", "sverige"], (60.1282, 18.6435)),
    (&["finland", "suomi"], (61.9241, 25.7482)),
    (&["denmark", "danmark"], (56.2639, 9.5018)),
    (&["poland", "polska"], (51.9194, 19.1451)),
    (&["czech republic", "czechia", "česko"], (49.8175, 15.4730)),
    (&["slovakia", "slovensko"], (48.6690, 19.6990)),
    (&["hungary", "magyarország"], (47.1625, 19.5033)),
    (&["slovenia", "slovenija"], (46.1512, 14.9955)),
    (&["croatia", "hrvatska"], (45.1000, 15.2000)),
    (&["greece", "hellas", "ελλάδα"], (39.0742, 21.8243)),
    (&["turkey", "türkiye", "turkiye"], (38.9637, 35.2433)),
    (&["romania", "românia"], (45.9432, 24.9668)),
    (&["bulgaria", "българия"], (42.7339, 25.4858)),
    (&["montenegro", "crna gora"], (42.7087, 19.3744)),
    (&["morocco", "maroc"], (31.7917, -7.0926)),
    (&["united states", "usa", "united states of america"], (37.0902, -95.7129)),
    (&["canada"], (56.1304, -106.3468)),
    (&["mexico", "méxico"], (23.6345, -102.5528)),
    (&["peru", "perú"], (-9.1900, -75.0152)),
    (&["chile"], (-35.6751, -71.5430)),
    (&["argentina"], (-38.4161, -63.6167)),
    (&["brazil", "brasil"], (-14.2350, -51.9253)),
    (&["japan", "nippon", "日本"], (36.2048, 138.2529)),
    (&["vietnam", "viet nam"], (14.0583, 108.2772)),
    (&["thailand"], (15.8700, 100.9925)),
    (&["nepal"], (28.3949, 84.1240)),
    (&["india", "bharat"], (20.5937, 78.9629)),
    (&["australia"], (-25.2744, 133.7751)),
    (&["new zealand", "aotearoa"], (-40.9006, 174.8860)),
    (&["south africa"], (-30.5595, 22.9375)),
];

/// Known centroid for `country`, matched case-insensitively.
pub fn lookup(country: &str) -> Option<Coordinates> {
    let key = country.trim().to_lowercase();
    COUNTRY_CENTROIDS
        .iter()
        .find(|(names, _)| names.contains(&key.as_str()))
        .and_then(|(_, (lat, lng))| Coordinates::new(*lat, *lng).ok())
}

pub fn default_centroid() -> Coordinates {
    Coordinates {
        lat: DEFAULT_CENTROID.0,
        lng: DEFAULT_CENTROID.1,
    }
}
