//! Static mapping tables resolving a `Filter`'s string fields (spec §6).

use sg_models::Filter;

/// Canonical genre tokens accepted by the public catalog URL (spec §6).
/// Matching is case-insensitive against both the canonical token and its
/// lowercase/hyphen/ampersand-free alias, mirroring the original's
/// permissive genre-alias handling.
const GENRES: &[&str] = &[
    "Action & Adventure",
    "Animation",
    "Comedy",
    "Crime",
    "Documentary",
    "Drama",
    "Fantasy",
    "History",
    "Horror",
    "Kids & Family",
    "Made in Europe",
    "Music & Musical",
    "Mystery & Thriller",
    "Reality TV",
    "Romance",
    "Science-Fiction",
    "Sport",
    "War & Military",
    "Western",
];

const PLATFORMS: &[(&str, &str)] = &[
    ("Netflix", "netflix"),
    ("Disney+", "disney"),
    ("Prime Video", "amazon"),
    ("HBO Max", "hbo"),
    ("Apple TV+", "apple"),
    ("Hulu", "hulu"),
    ("Paramount+", "paramount"),
];

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("Film", "Film"),
    ("Movie", "Film"),
    ("Série", "Serie"),
    ("Series", "Serie"),
    ("TV Show", "Serie"),
];

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Resolve a genre string to its canonical form. Accepts the canonical
/// token itself (any case) as well as a loosened form with `&`/`-`/spaces
/// stripped, so `"action adventure"` and `"Action & Adventure"` both match.
pub fn resolve_genre(input: &str) -> Option<&'static str> {
    let want = normalize(input);
    let want_loose: String = want.chars().filter(|c| c.is_alphanumeric()).collect();
    GENRES.iter().find(|g| {
        let g_norm = normalize(g);
        let g_loose: String = g_norm.chars().filter(|c| c.is_alphanumeric()).collect();
        g_norm == want || g_loose == want_loose
    }).copied()
}

/// Resolve a platform display name to its URL token.
pub fn resolve_platform(input: &str) -> Option<&'static str> {
    let want = normalize(input);
    PLATFORMS
        .iter()
        .find(|(name, _)| normalize(name) == want)
        .map(|(_, token)| *token)
}

/// Resolve a content-type display name to its canonical URL value.
pub fn resolve_content_type(input: &str) -> Option<&'static str> {
    let want = normalize(input);
    CONTENT_TYPES
        .iter()
        .find(|(name, _)| normalize(name) == want)
        .map(|(_, token)| *token)
}

/// HeyGen template IDs keyed by genre (spec §6). Unknown genres fall back
/// to `default`.
pub fn heygen_template_for_genre(genre: &str) -> &'static str {
    let want = normalize(genre);
    match want.as_str() {
        "horror" => "e2ad0e5c7e71483991536f5c93594e42",
        "comedy" => "15d9eadcb46a45dbbca1834aa0a23ede",
        "action" | "action & adventure" => "e44b139a1b94446a997a7f2ac5ac4178",
        _ => DEFAULT_HEYGEN_TEMPLATE,
    }
}

pub const DEFAULT_HEYGEN_TEMPLATE: &str = "cc6718c5363e42b282a123f99b94b335";

/// Fixed per-platform badge color table for the enhanced-poster renderer.
/// Not present in the retrieval pack's surviving `config/constants.py`
/// body (only its module docstring survived extraction) — this table is
/// a reasonable fabrication, recorded as an Open Question resolution in
/// DESIGN.md.
pub fn platform_badge_color(platform_token: &str) -> [u8; 3] {
    match platform_token {
        "netflix" => [229, 9, 20],
        "disney" => [17, 60, 207],
        "amazon" => [0, 168, 225],
        "hbo" => [90, 40, 140],
        "apple" => [160, 160, 165],
        "hulu" => [28, 231, 131],
        "paramount" => [0, 100, 255],
        _ => [120, 120, 120],
    }
}

/// Build the public catalog URL a job's filter resolves to (spec §6),
/// used by the scroll-screencast invoker.
pub fn resolve_catalog_url(filter: &Filter) -> Result<url::Url, CatalogUrlError> {
    let genre = resolve_genre(&filter.genre).ok_or_else(|| CatalogUrlError::UnknownGenre(filter.genre.clone()))?;
    let platform = resolve_platform(&filter.platform)
        .ok_or_else(|| CatalogUrlError::UnknownPlatform(filter.platform.clone()))?;
    let content_type = resolve_content_type(&filter.content_type)
        .ok_or_else(|| CatalogUrlError::UnknownContentType(filter.content_type.clone()))?;

    let url = format!(
        "https://streamgank.com/?country={}&genres={}&platforms={}&type={}",
        urlencoding::encode(&filter.country),
        urlencoding::encode(genre),
        urlencoding::encode(platform),
        urlencoding::encode(content_type),
    );
    url::Url::parse(&url).map_err(|e| CatalogUrlError::Malformed(e.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogUrlError {
    #[error("unknown genre: {0}")]
    UnknownGenre(String),
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),
    #[error("unknown content_type: {0}")]
    UnknownContentType(String),
    #[error("malformed catalog url: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_canonical_and_loose_genre() {
        assert_eq!(resolve_genre("Horror"), Some("Horror"));
        assert_eq!(resolve_genre("horror"), Some("Horror"));
        assert_eq!(resolve_genre("Action Adventure"), Some("Action & Adventure"));
        assert_eq!(resolve_genre("nonsense"), None);
    }

    #[test]
    fn resolves_platform_tokens() {
        assert_eq!(resolve_platform("Netflix"), Some("netflix"));
        assert_eq!(resolve_platform("Prime Video"), Some("amazon"));
        assert_eq!(resolve_platform("Peacock"), None);
    }

    #[test]
    fn resolves_content_type_aliases() {
        assert_eq!(resolve_content_type("Movie"), Some("Film"));
        assert_eq!(resolve_content_type("TV Show"), Some("Serie"));
    }

    #[test]
    fn heygen_template_falls_back_to_default() {
        assert_eq!(heygen_template_for_genre("Horror"), "e2ad0e5c7e71483991536f5c93594e42");
        assert_eq!(heygen_template_for_genre("Documentary"), DEFAULT_HEYGEN_TEMPLATE);
    }

    #[test]
    fn catalog_url_resolves_all_four_fields() {
        let filter = Filter::new("US", "Netflix", "Horror", "Film", 3);
        let url = resolve_catalog_url(&filter).unwrap();
        assert_eq!(url.host_str(), Some("streamgank.com"));
        assert!(url.query().unwrap().contains("country=US"));
    }

    #[test]
    fn catalog_url_rejects_unknown_platform() {
        let filter = Filter::new("US", "Peacock", "Horror", "Film", 3);
        assert!(matches!(
            resolve_catalog_url(&filter),
            Err(CatalogUrlError::UnknownPlatform(_))
        ));
    }
}
