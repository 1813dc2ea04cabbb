use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use super::Population;

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

const PROFILE_SEGMENT: &str = "/doctors/";

/// `{base}/search?type=doctor[&country_id=N]&page=P`
pub fn listing_url(base: &Url, population: Population, page: u32) -> Url {
    let mut url = base.clone();
    url.set_path("/search");
    url.set_fragment(None);
    {
        let mut query = url.query_pairs_mut();
        query.clear().append_pair("type", "doctor");
        if let Some(id) = population.listing_id() {
            query.append_pair("country_id", &id.to_string());
        }
        query.append_pair("page", &page.to_string());
    }
    url
}

/// Profile links on a listing page, absolute, without query or fragment,
/// first occurrence order.
pub fn profile_references(html: &str, base: &Url) -> Vec<String> {
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();
    doc.select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .filter_map(|mut url| {
            url.set_query(None);
            url.set_fragment(None);
            let path = url.path();
            (path.contains(PROFILE_SEGMENT) && !path.ends_with(PROFILE_SEGMENT))
                .then(|| url.to_string())
        })
        .filter(|r| seen.insert(r.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://sasthyaseba.com").unwrap()
    }

    #[test]
    fn listing_urls_per_population() {
        assert_eq!(
            listing_url(&base(), Population::All, 3).as_str(),
            "https://sasthyaseba.com/search?type=doctor&page=3"
        );
        assert_eq!(
            listing_url(&base(), Population::Bangladesh, 1).as_str(),
            "https://sasthyaseba.com/search?type=doctor&country_id=18&page=1"
        );
        assert_eq!(
            listing_url(&base(), Population::India, 45).as_str(),
            "https://sasthyaseba.com/search?type=doctor&country_id=103&page=45"
        );
    }

    #[test]
    fn references_from_fixture() {
        let html = std::fs::read_to_string("tests/fixtures/listing_page.html").unwrap();
        let refs = profile_references(&html, &base());
        assert_eq!(
            refs,
            [
                "https://sasthyaseba.com/doctors/dr-rahim-uddin",
                "https://sasthyaseba.com/doctors/prof-anika-rahman",
                "https://sasthyaseba.com/doctors/dr-sourav-banerjee",
            ]
        );
    }

    #[test]
    fn non_profile_links_ignored() {
        let html = r##"<a href="/hospitals/x">H</a><a href="/doctors/">All</a><a href="#top">Top</a>"##;
        assert!(profile_references(html, &base()).is_empty());
    }
}
