//! Content types returned by the CMS.
//!
//! Field names follow the GraphQL schema (camelCase on the wire). Every field
//! the CMS may omit is optional and defaults, so a query that selects a
//! subset of fields (archive listings) decodes into the same types as the
//! single-item queries.

use serde::{Deserialize, Serialize};

/// Fields every content node carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeFields {
    pub id: String,
    /// Stable across draft and published states.
    pub database_id: i64,
    pub title: Option<String>,
    /// Public identifier; may differ between draft and published states.
    pub slug: Option<String>,
    pub date: Option<String>,
    pub modified: Option<String>,
    pub content: Option<String>,
    pub status: Option<String>,
    pub uri: Option<String>,
    pub seo: Option<SeoMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    #[serde(flatten)]
    pub node: NodeFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Post {
    #[serde(flatten)]
    pub node: NodeFields,
    pub excerpt: Option<String>,
    pub author: Option<Edge<Author>>,
    pub categories: Option<Connection<Term>>,
    pub tags: Option<Connection<Term>>,
    pub featured_image: Option<Edge<FeaturedImage>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    #[serde(flatten)]
    pub node: NodeFields,
    pub featured_image: Option<Edge<FeaturedImage>>,
    /// Job tags and departments, told apart by `__typename`.
    pub terms: Option<Connection<JobTerm>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseStudy {
    #[serde(flatten)]
    pub node: NodeFields,
    pub featured_image: Option<Edge<FeaturedImage>>,
    pub categories: Option<Connection<Term>>,
}

/// A resolved content item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "contentType", rename_all = "camelCase")]
pub enum ContentItem {
    Page(Page),
    Post(Post),
    Job(Job),
    CaseStudy(CaseStudy),
}

impl ContentItem {
    pub fn node(&self) -> &NodeFields {
        match self {
            ContentItem::Page(p) => &p.node,
            ContentItem::Post(p) => &p.node,
            ContentItem::Job(j) => &j.node,
            ContentItem::CaseStudy(c) => &c.node,
        }
    }

    pub fn node_mut(&mut self) -> &mut NodeFields {
        match self {
            ContentItem::Page(p) => &mut p.node,
            ContentItem::Post(p) => &mut p.node,
            ContentItem::Job(j) => &mut j.node,
            ContentItem::CaseStudy(c) => &mut c.node,
        }
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            ContentItem::Page(_) => ContentType::Page,
            ContentItem::Post(_) => ContentType::Post,
            ContentItem::Job(_) => ContentType::Job,
            ContentItem::CaseStudy(_) => ContentType::CaseStudy,
        }
    }

    pub fn seo(&self) -> Option<&SeoMetadata> {
        self.node().seo.as_ref()
    }

    pub fn title(&self) -> Option<&str> {
        self.node().title.as_deref()
    }

    /// Only posts have a native excerpt.
    pub fn excerpt(&self) -> Option<&str> {
        match self {
            ContentItem::Post(p) => p.excerpt.as_deref(),
            _ => None,
        }
    }

    pub fn featured_image(&self) -> Option<&FeaturedImage> {
        let edge = match self {
            ContentItem::Page(_) => None,
            ContentItem::Post(p) => p.featured_image.as_ref(),
            ContentItem::Job(j) => j.featured_image.as_ref(),
            ContentItem::CaseStudy(c) => c.featured_image.as_ref(),
        };
        edge.and_then(|e| e.node.as_ref())
    }
}

/// Discriminator returned by the content-type probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentType {
    Page,
    Post,
    Job,
    CaseStudy,
    Unknown(String),
}

impl ContentType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "page" => ContentType::Page,
            "post" => ContentType::Post,
            "job" => ContentType::Job,
            "caseStudy" | "case-study" | "case_study" => ContentType::CaseStudy,
            other => ContentType::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ContentType::Page => "page",
            ContentType::Post => "post",
            ContentType::Job => "job",
            ContentType::CaseStudy => "caseStudy",
            ContentType::Unknown(name) => name,
        }
    }
}

/// Result of the cheap existence + type probe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentInfo {
    pub database_id: i64,
    pub content_type_name: String,
    pub uri: Option<String>,
    pub status: Option<String>,
    pub slug: Option<String>,
}

impl ContentInfo {
    pub fn content_type(&self) -> ContentType {
        ContentType::from_name(&self.content_type_name)
    }

    pub fn is_draft(&self) -> bool {
        self.status.as_deref() == Some("draft")
    }
}

// ============ SEO ============

/// SEO block attached to content nodes by the CMS's SEO plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeoMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub canonical_url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub focus_keywords: Vec<String>,
    pub breadcrumb_title: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub robots: Vec<String>,
    /// Raw `<head>` markup emitted by the plugin.
    pub full_head: Option<String>,
    pub json_ld: Option<JsonLdBlock>,
    pub open_graph: Option<OpenGraph>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JsonLdBlock {
    /// Possibly script-wrapped, possibly entity-encoded JSON.
    pub raw: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenGraph {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub site_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub locale: Option<String>,
    pub updated_time: Option<String>,
    pub image: Option<OpenGraphImage>,
    pub article_meta: Option<ArticleMeta>,
    pub twitter_meta: Option<TwitterMeta>,
    #[serde(deserialize_with = "null_as_default")]
    pub slack_enhanced_data: Vec<SlackEnhancedData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenGraphImage {
    pub url: Option<String>,
    pub secure_url: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArticleMeta {
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub section: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    pub published_time: Option<String>,
    pub modified_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TwitterMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub card: Option<String>,
    pub image: Option<String>,
    pub site: Option<String>,
    pub creator: Option<String>,
    pub app_country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackEnhancedData {
    pub label: Option<String>,
    pub data: Option<String>,
}

// ============ Shared shapes ============

/// GraphQL single-node edge (`{ node { ... } }`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Edge<T> {
    pub node: Option<T>,
}

impl<T> Default for Edge<T> {
    fn default() -> Self {
        Self { node: None }
    }
}

/// GraphQL list connection (`{ nodes [ ... ] }`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "T: Deserialize<'de>"))]
pub struct Connection<T> {
    #[serde(deserialize_with = "null_as_default")]
    pub nodes: Vec<T>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Author {
    pub name: Option<String>,
    pub description: Option<String>,
    pub avatar: Option<Avatar>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Avatar {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Term {
    pub name: Option<String>,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobTerm {
    #[serde(rename = "__typename")]
    pub typename: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeaturedImage {
    pub source_url: Option<String>,
    pub alt_text: Option<String>,
    pub media_details: Option<MediaDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaDetails {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// GraphQL returns `null` for empty lists; treat it like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Static link shown on the archive index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveLink {
    pub href: String,
    pub label: String,
}
