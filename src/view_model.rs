//! View models handed to presentation.
//!
//! [`build_view_model`] takes a fetched content item and produces everything
//! a template needs: the item itself, its SEO block with backend URLs moved
//! to the frontend origin, the parsed `<meta>` map, display-ready JSON-LD and
//! resolved page metadata (title/description fallback chains, Open Graph,
//! Twitter card).
//!
//! A view model never carries a backend-origin link. The raw SEO block is
//! moved out of the item and only its rewritten copy is kept; links in the
//! body HTML and excerpt are rewritten the same way. Image URLs stay on the
//! backend.

use serde::Serialize;

use crate::head_meta::{parse_head_meta, HeadMetaMap};
use crate::jsonld::{normalize_json_ld, NormalizedJsonLd};
use crate::models::{ContentItem, SeoMetadata};
use crate::rewrite::DomainRewriter;

const DEFAULT_TWITTER_CARD: &str = "summary_large_image";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    /// The fetched item with its raw `seo` block removed.
    pub content: ContentItem,
    pub rewritten_seo: Option<SeoMetadata>,
    pub head_meta: HeadMetaMap,
    /// Indented JSON-LD for display.
    pub formatted_json_ld: String,
    pub metadata: PageMetadata,
}

/// Resolved `<head>` values for the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub canonical: String,
    pub robots: Option<Robots>,
    pub open_graph: OpenGraphMeta,
    pub twitter: TwitterCard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Robots {
    pub index: bool,
    pub follow: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenGraphMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: String,
    pub site_name: Option<String>,
    pub locale: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub published_time: Option<String>,
    pub modified_time: Option<String>,
    pub images: Vec<SocialImage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialImage {
    pub url: String,
    pub secure_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitterCard {
    pub card: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub site: Option<String>,
    pub creator: Option<String>,
    pub images: Vec<String>,
}

/// Builds the view model for `content`.
///
/// # Arguments
///
/// - `content`: the item returned by the second resolution phase. It is
///   consumed: its `seo` block moves into the view model as
///   [`ViewModel::rewritten_seo`], and its body HTML and excerpt are rewritten
///   in place.
/// - `rewriter`: the deployment's [`DomainRewriter`]. An inactive rewriter
///   leaves every URL as fetched.
///
/// # Returns
///
/// A [`ViewModel`] in which every non-image link to the backend origin has
/// been moved to the frontend origin. Malformed JSON-LD or head markup
/// degrades to fewer entries; building never fails.
///
/// # Example
///
/// ```rust
/// use headless_press::models::{ContentItem, NodeFields, Page, SeoMetadata};
/// use headless_press::rewrite::DomainRewriter;
/// use headless_press::view_model::build_view_model;
///
/// let rewriter = DomainRewriter::new(
///     Some("https://site.example"),
///     Some("https://cms.example"),
///     None,
/// );
/// let page = ContentItem::Page(Page {
///     node: NodeFields {
///         title: Some("About".into()),
///         seo: Some(SeoMetadata {
///             canonical_url: Some("https://cms.example/about/".into()),
///             ..Default::default()
///         }),
///         ..Default::default()
///     },
/// });
///
/// let view = build_view_model(page, &rewriter);
/// assert_eq!(view.metadata.canonical, "https://site.example/about/");
/// assert!(view.content.seo().is_none());
/// ```
pub fn build_view_model(mut content: ContentItem, rewriter: &DomainRewriter) -> ViewModel {
    let (rewritten_seo, json_ld) = match content.node_mut().seo.take() {
        Some(seo) => {
            let (seo, json_ld) = rewrite_seo(&seo, rewriter);
            (Some(seo), json_ld)
        }
        None => (None, NormalizedJsonLd::default()),
    };

    rewrite_body(&mut content, rewriter);

    let head_meta = rewritten_seo
        .as_ref()
        .and_then(|seo| seo.full_head.as_deref())
        .map(parse_head_meta)
        .unwrap_or_default();

    let metadata = page_metadata(&content, rewritten_seo.as_ref(), rewriter);

    ViewModel {
        content,
        rewritten_seo,
        head_meta,
        formatted_json_ld: json_ld.pretty,
        metadata,
    }
}

/// Moves backend links in the body HTML and the post excerpt.
fn rewrite_body(content: &mut ContentItem, rewriter: &DomainRewriter) {
    let node = content.node_mut();
    node.content = node.content.as_deref().map(|html| rewriter.rewrite_text(html));
    if let ContentItem::Post(post) = content {
        post.excerpt = post.excerpt.as_deref().map(|html| rewriter.rewrite_text(html));
    }
}

/// Returns a rewritten copy of `seo` and the normalized JSON-LD.
///
/// `canonicalUrl`, `openGraph.url` and every non-image URL in `fullHead` move
/// to the frontend origin. When the JSON-LD parses, its compact rewritten
/// form replaces `jsonLd.raw`; otherwise the raw text is kept with its
/// embedded links rewritten as free text.
pub fn rewrite_seo(seo: &SeoMetadata, rewriter: &DomainRewriter) -> (SeoMetadata, NormalizedJsonLd) {
    let mut out = seo.clone();

    out.canonical_url = rewriter.rewrite_opt(seo.canonical_url.as_deref());
    if let Some(og) = out.open_graph.as_mut() {
        og.url = rewriter.rewrite_opt(og.url.as_deref());
    }
    out.full_head = seo.full_head.as_deref().map(|head| rewriter.rewrite_text(head));

    let raw = seo
        .json_ld
        .as_ref()
        .and_then(|block| block.raw.as_deref())
        .unwrap_or_default();
    let mut json_ld = normalize_json_ld(raw, rewriter);
    if let Some(block) = out.json_ld.as_mut() {
        if json_ld.parsed {
            block.raw = Some(json_ld.canonical.clone());
        } else {
            block.raw = block.raw.as_deref().map(|r| rewriter.rewrite_text(r));
        }
    }
    if !json_ld.parsed {
        json_ld.pretty = rewriter.rewrite_text(&json_ld.pretty);
        json_ld.canonical = rewriter.rewrite_text(&json_ld.canonical);
    }

    (out, json_ld)
}

/// Resolves title, description, canonical URL and social cards.
///
/// Every field prefers its most specific override, then the general SEO
/// value, then the content's own field. Empty strings count as absent.
pub fn page_metadata(
    content: &ContentItem,
    seo: Option<&SeoMetadata>,
    rewriter: &DomainRewriter,
) -> PageMetadata {
    let node = content.node();
    let og = seo.and_then(|s| s.open_graph.as_ref());
    let twitter = og.and_then(|o| o.twitter_meta.as_ref());
    let article = og.and_then(|o| o.article_meta.as_ref());

    let seo_title = seo.and_then(|s| s.title.as_deref());
    let seo_description = seo.and_then(|s| s.description.as_deref());
    let native_title = content.title();
    let native_excerpt = content.excerpt();

    let fallback_path = node.uri.as_deref().filter(|u| !u.is_empty()).unwrap_or("/");
    let canonical_source = seo.and_then(|s| s.canonical_url.as_deref()).filter(|u| !u.is_empty());
    let canonical = rewriter.frontend_url(fallback_path, canonical_source);
    let og_url = rewriter.frontend_url(
        fallback_path,
        pick([og.and_then(|o| o.url.as_deref()), canonical_source]).as_deref(),
    );

    let robots = seo.filter(|s| !s.robots.is_empty()).map(|s| Robots {
        index: !s.robots.iter().any(|r| r.trim() == "noindex"),
        follow: !s.robots.iter().any(|r| r.trim() == "nofollow"),
    });

    let default_kind = match content {
        ContentItem::Post(_) => "article",
        _ => "website",
    };

    let images: Vec<SocialImage> = og
        .and_then(|o| o.image.as_ref())
        .and_then(|img| {
            let url = pick([img.url.as_deref()])?;
            Some(SocialImage {
                secure_url: pick([img.secure_url.as_deref()]).unwrap_or_else(|| url.clone()),
                url,
                width: img.width,
                height: img.height,
                kind: img.kind.clone(),
                alt: pick([
                    content.featured_image().and_then(|f| f.alt_text.as_deref()),
                    native_title,
                ]),
            })
        })
        .into_iter()
        .collect();

    PageMetadata {
        title: pick([seo_title, native_title]),
        description: pick([seo_description, native_excerpt]),
        canonical,
        robots,
        open_graph: OpenGraphMeta {
            title: pick([og.and_then(|o| o.title.as_deref()), seo_title, native_title]),
            description: pick([
                og.and_then(|o| o.description.as_deref()),
                seo_description,
                native_excerpt,
            ]),
            url: og_url,
            site_name: pick([og.and_then(|o| o.site_name.as_deref())]),
            locale: pick([og.and_then(|o| o.locale.as_deref())]),
            kind: pick([og.and_then(|o| o.kind.as_deref())])
                .unwrap_or_else(|| default_kind.to_string()),
            published_time: pick([
                article.and_then(|a| a.published_time.as_deref()),
                node.date.as_deref(),
            ]),
            modified_time: pick([
                article.and_then(|a| a.modified_time.as_deref()),
                node.modified.as_deref(),
            ]),
            images,
        },
        twitter: TwitterCard {
            card: pick([twitter.and_then(|t| t.card.as_deref())])
                .unwrap_or_else(|| DEFAULT_TWITTER_CARD.to_string()),
            title: pick([twitter.and_then(|t| t.title.as_deref()), seo_title, native_title]),
            description: pick([
                twitter.and_then(|t| t.description.as_deref()),
                seo_description,
                native_excerpt,
            ]),
            site: pick([twitter.and_then(|t| t.site.as_deref())]),
            creator: pick([twitter.and_then(|t| t.creator.as_deref())]),
            images: pick([twitter.and_then(|t| t.image.as_deref())])
                .into_iter()
                .collect(),
        },
    }
}

/// First candidate that is present and non-empty.
fn pick<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
