//! Scraping sessions.
//!
//! A [`Collector`] is one independent scraping session. It shares transport
//! and charset settings with the [`Scraper`](super::Scraper) it was cloned
//! from, but owns its callback list, so lookups running concurrently against
//! the same provider never see each other's callbacks.

use crate::fetch::FetchClient;
use crate::provider::ProviderError;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

/// How many interstitial pages a single visit may pass through.
pub const MAX_INTERSTITIAL_HOPS: usize = 3;

type HtmlCallback<'c, T> = Box<dyn FnMut(&mut T, &HtmlElement<'_>) + 'c>;
type InterstitialRule<'c> = Box<dyn Fn(&HtmlElement<'_>) -> Option<String> + 'c>;

/// A fetched page, decoded to UTF-8.
#[derive(Debug, Clone)]
pub struct Page {
    url: Url,
    html: String,
}

impl Page {
    /// URL used to resolve relative links on the page
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// An element matched by a selector, with helpers for field extraction.
pub struct HtmlElement<'a> {
    element: ElementRef<'a>,
    page_url: &'a Url,
}

impl<'a> HtmlElement<'a> {
    fn new(element: ElementRef<'a>, page_url: &'a Url) -> Self {
        Self { element, page_url }
    }

    /// The element's text content with surrounding whitespace removed.
    pub fn text(&self) -> String {
        collect_text(self.element)
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Text of the first descendant matching `css`.
    pub fn child_text(&self, css: &str) -> Option<String> {
        let selector = parse_child_selector(css)?;
        self.element.select(&selector).next().map(collect_text)
    }

    /// Texts of all descendants matching `css`, skipping empty ones.
    pub fn child_texts(&self, css: &str) -> Vec<String> {
        let Some(selector) = parse_child_selector(css) else {
            return Vec::new();
        };
        self.element
            .select(&selector)
            .map(collect_text)
            .filter(|text| !text.is_empty())
            .collect()
    }

    /// Attribute `name` of the first descendant matching `css`.
    pub fn child_attr(&self, css: &str, name: &str) -> Option<String> {
        let selector = parse_child_selector(css)?;
        self.element
            .select(&selector)
            .find_map(|child| child.value().attr(name))
            .map(str::to_string)
    }

    /// Resolves `href` against the URL of the page this element came from.
    pub fn absolute_url(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        self.page_url.join(href).ok().map(String::from)
    }
}

fn collect_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn parse_child_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!(selector = css, error = %e, "invalid child selector");
            None
        }
    }
}

fn parse_selector(css: &str) -> Result<Selector, ProviderError> {
    Selector::parse(css).map_err(|e| ProviderError::InvalidSelector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// Returns true for content types extraction callbacks can work on.
fn is_markup(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.is_empty()
        || essence.starts_with("text/")
        || essence.contains("html")
        || essence.contains("xml")
}

/// An independent scraping session.
///
/// Callbacks receive the lookup's state (usually the record being built)
/// and are run in registration order, each over all of its matches, once
/// the final page content is known.
pub struct Collector<'c, T> {
    name: String,
    client: FetchClient,
    allowed_hosts: Vec<String>,
    detect_charset: bool,
    interstitials: Vec<(Selector, InterstitialRule<'c>)>,
    callbacks: Vec<(Selector, HtmlCallback<'c, T>)>,
}

impl<'c, T> Collector<'c, T> {
    pub(crate) fn new(
        name: impl Into<String>,
        client: FetchClient,
        allowed_hosts: Vec<String>,
        detect_charset: bool,
    ) -> Self {
        Self {
            name: name.into(),
            client,
            allowed_hosts,
            detect_charset,
            interstitials: Vec::new(),
            callbacks: Vec::new(),
        }
    }

    /// Registers an extraction callback for every element matching `css`.
    ///
    /// A selector that matches nothing simply never calls `callback`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidSelector`] if `css` does not parse.
    pub fn on_html<F>(&mut self, css: &str, callback: F) -> Result<&mut Self, ProviderError>
    where
        F: FnMut(&mut T, &HtmlElement<'_>) + 'c,
    {
        let selector = parse_selector(css)?;
        self.callbacks.push((selector, Box::new(callback)));
        Ok(self)
    }

    /// Registers an interstitial rule.
    ///
    /// `resolve` is called for elements matching `css`; returning a link
    /// marks the page as an interstitial (an age gate, for example). The
    /// link is fetched by a child session and its body replaces the page
    /// before any extraction callback runs. The page keeps its original
    /// URL.
    pub fn on_interstitial<F>(&mut self, css: &str, resolve: F) -> Result<&mut Self, ProviderError>
    where
        F: Fn(&HtmlElement<'_>) -> Option<String> + 'c,
    {
        let selector = parse_selector(css)?;
        self.interstitials.push((selector, Box::new(resolve)));
        Ok(self)
    }

    /// Creates a child session with the same configuration and no
    /// callbacks or interstitial rules.
    pub fn child(&self) -> Collector<'static, ()> {
        Collector::new(
            self.name.clone(),
            self.client.clone(),
            self.allowed_hosts.clone(),
            self.detect_charset,
        )
    }

    /// Fetches and decodes `url` without running any callbacks.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::ForbiddenHost`] for URLs outside the allowed
    /// hosts, [`ProviderError::Fetch`] for transport failures and
    /// [`ProviderError::Parse`] for responses that are not markup.
    pub fn fetch_page(&self, url: &Url) -> Result<Page, ProviderError> {
        self.check_host(url)?;

        let fetched = self.client.fetch(url.as_str())?;
        if let Some(content_type) = fetched.content_type() {
            if !is_markup(content_type) {
                return Err(ProviderError::Parse {
                    url: url.to_string(),
                    reason: format!("unexpected content type {content_type}"),
                });
            }
        }

        Ok(Page {
            url: fetched.url().clone(),
            html: fetched.text_with(self.detect_charset),
        })
    }

    /// Visits `url`, running every registered callback against `state`.
    ///
    /// Blocks until the page and any interstitials have been fetched and
    /// all callbacks have run.
    pub fn visit(&mut self, url: &str, state: &mut T) -> Result<(), ProviderError> {
        let url = Url::parse(url).map_err(|e| ProviderError::MalformedUrl {
            url: url.to_string(),
            source: e,
        })?;

        let page = self.fetch_page(&url)?;
        let page = self.resolve_interstitials(page)?;

        let document = Html::parse_document(&page.html);
        for (selector, callback) in self.callbacks.iter_mut() {
            for element in document.select(selector) {
                callback(&mut *state, &HtmlElement::new(element, &page.url));
            }
        }

        Ok(())
    }

    fn resolve_interstitials(&self, mut page: Page) -> Result<Page, ProviderError> {
        for _ in 0..MAX_INTERSTITIAL_HOPS {
            let Some(target) = self.find_interstitial(&page)? else {
                return Ok(page);
            };

            debug!(provider = %self.name, from = %page.url, to = %target, "following interstitial");
            let nested = self.child().fetch_page(&target)?;
            page.html = nested.html;
        }

        match self.find_interstitial(&page)? {
            None => Ok(page),
            Some(_) => Err(ProviderError::Parse {
                url: page.url.to_string(),
                reason: format!(
                    "still on an interstitial page after {MAX_INTERSTITIAL_HOPS} redirects"
                ),
            }),
        }
    }

    fn find_interstitial(&self, page: &Page) -> Result<Option<Url>, ProviderError> {
        if self.interstitials.is_empty() {
            return Ok(None);
        }

        let document = Html::parse_document(&page.html);
        for (selector, resolve) in &self.interstitials {
            for element in document.select(selector) {
                if let Some(href) = resolve(&HtmlElement::new(element, &page.url)) {
                    return page
                        .url
                        .join(&href)
                        .map(Some)
                        .map_err(|e| ProviderError::MalformedUrl { url: href, source: e });
                }
            }
        }

        Ok(None)
    }

    fn check_host(&self, url: &Url) -> Result<(), ProviderError> {
        if self.allowed_hosts.is_empty() {
            return Ok(());
        }

        let allowed = url.host_str().is_some_and(|host| {
            self.allowed_hosts
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(host))
        });
        if allowed {
            Ok(())
        } else {
            Err(ProviderError::ForbiddenHost {
                url: url.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;

    #[derive(Debug, Default)]
    struct Scraped {
        title: String,
        tags: Vec<String>,
        order: Vec<&'static str>,
    }

    fn collector(allowed_hosts: Vec<String>) -> Collector<'static, Scraped> {
        Collector::new("Test", FetchClient::new(), allowed_hosts, true)
    }

    fn html_mock<'a>(server: &'a MockServer, path: &str, body: &str) -> httpmock::Mock<'a> {
        let body = body.to_string();
        let path = path.to_string();
        server.mock(move |when, then| {
            when.path(path);
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body(body);
        })
    }

    #[test]
    fn test_callbacks_run_in_registration_order() {
        let server = MockServer::start();
        html_mock(
            &server,
            "/item",
            r#"<h1> Title </h1><ul><li>a</li><li>b</li></ul>"#,
        );

        let mut c = collector(Vec::new());
        c.on_html("li", |s: &mut Scraped, e| {
            s.tags.push(e.text());
            s.order.push("tag");
        })
        .unwrap()
        .on_html("h1", |s: &mut Scraped, e| {
            s.title = e.text();
            s.order.push("title");
        })
        .unwrap();

        let mut state = Scraped::default();
        c.visit(&server.url("/item"), &mut state).unwrap();

        assert_eq!(state.title, "Title");
        assert_eq!(state.tags, vec!["a", "b"]);
        assert_eq!(state.order, vec!["tag", "tag", "title"]);
    }

    #[test]
    fn test_missing_section_leaves_state_untouched() {
        let server = MockServer::start();
        html_mock(&server, "/bare", "<p>nothing useful</p>");

        let mut c = collector(Vec::new());
        c.on_html("h1", |s: &mut Scraped, e| s.title = e.text()).unwrap();

        let mut state = Scraped::default();
        c.visit(&server.url("/bare"), &mut state).unwrap();
        assert!(state.title.is_empty());
    }

    #[test]
    fn test_interstitial_body_is_spliced_in() {
        let server = MockServer::start();
        let gate = html_mock(
            &server,
            "/item",
            r#"<div id="gate"><a href="/age_check/item">I am over 18</a></div>"#,
        );
        let real = html_mock(&server, "/age_check/item", "<h1>Real Title</h1>");

        let mut c = collector(Vec::new());
        c.on_interstitial("#gate a", |e| {
            e.attr("href")
                .filter(|href| href.contains("age_check"))
                .map(str::to_string)
        })
        .unwrap()
        .on_html("h1", |s: &mut Scraped, e| s.title = e.text())
        .unwrap();

        let mut state = Scraped::default();
        c.visit(&server.url("/item"), &mut state).unwrap();

        gate.assert_hits(1);
        real.assert_hits(1);
        assert_eq!(state.title, "Real Title");
    }

    #[test]
    fn test_endless_interstitial_is_a_parse_error() {
        let server = MockServer::start();
        html_mock(&server, "/loop", r#"<a class="gate" href="/loop">enter</a>"#);

        let mut c = collector(Vec::new());
        c.on_interstitial("a.gate", |e| e.attr("href").map(str::to_string))
            .unwrap();

        let err = c.visit(&server.url("/loop"), &mut Scraped::default()).unwrap_err();
        assert!(matches!(err, ProviderError::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn test_forbidden_host_is_rejected_before_fetching() {
        let mut c = collector(vec!["example.com".to_string()]);
        let err = c
            .visit("http://127.0.0.1:9/page", &mut Scraped::default())
            .unwrap_err();

        assert!(matches!(err, ProviderError::ForbiddenHost { .. }));
    }

    #[test]
    fn test_non_markup_response_is_a_parse_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.path("/image");
            then.status(200)
                .header("content-type", "image/png")
                .body([0x89u8, 0x50, 0x4E, 0x47]);
        });

        let err = collector(Vec::new())
            .visit(&server.url("/image"), &mut Scraped::default())
            .unwrap_err();
        assert!(matches!(err, ProviderError::Parse { .. }));
    }

    #[test]
    fn test_fetch_failure_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.path("/gone");
            then.status(500);
        });

        let err = collector(Vec::new())
            .visit(&server.url("/gone"), &mut Scraped::default())
            .unwrap_err();
        assert!(matches!(err, ProviderError::Fetch(_)));
    }

    #[test]
    fn test_invalid_selector() {
        let mut c = collector(Vec::new());
        let result = c.on_html("td:::nope", |_: &mut Scraped, _| {});
        assert!(matches!(result, Err(ProviderError::InvalidSelector { .. })));
    }

    #[test]
    fn test_element_helpers_resolve_relative_urls() {
        let server = MockServer::start();
        html_mock(
            &server,
            "/products/1",
            r#"<div class="box"><a href="../img/cover.jpg"><img src="thumb.jpg"></a><span> x </span><span></span></div>"#,
        );

        let mut c: Collector<'_, Vec<String>> =
            Collector::new("Test", FetchClient::new(), Vec::new(), false);
        c.on_html("div.box", |out: &mut Vec<String>, e| {
            out.extend(e.child_attr("a", "href").and_then(|h| e.absolute_url(&h)));
            out.extend(e.child_attr("img", "src").and_then(|h| e.absolute_url(&h)));
            out.extend(e.child_texts("span"));
        })
        .unwrap();

        let mut out = Vec::new();
        c.visit(&server.url("/products/1"), &mut out).unwrap();

        assert_eq!(
            out,
            vec![
                server.url("/img/cover.jpg"),
                server.url("/products/thumb.jpg"),
                "x".to_string(),
            ]
        );
    }
}
