//! Named GraphQL operations sent to the CMS.
//!
//! Each [`Operation`] pairs the document with the root field its data lives
//! under, so [`crate::cms::ContentApi`] can unwrap responses generically.

/// A named GraphQL document and the `data` field it populates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    pub root_field: &'static str,
    pub document: &'static str,
}

macro_rules! node_fields {
    () => {
        "id databaseId title slug date modified content status uri"
    };
}

macro_rules! seo_fields {
    () => {
        " seo { title description canonicalUrl focusKeywords breadcrumbTitle robots fullHead \
         jsonLd { raw } \
         openGraph { title description url siteName type locale updatedTime \
         slackEnhancedData { label data } \
         articleMeta { author publisher section tags publishedTime modifiedTime } \
         image { url secureUrl height width type } \
         twitterMeta { title description card image site creator appCountry } } }"
    };
}

macro_rules! featured_image_fields {
    () => {
        " featuredImage { node { sourceUrl altText mediaDetails { width height } } }"
    };
}

macro_rules! job_terms_fields {
    () => {
        " terms { nodes { __typename ... on JobTag { id name } ... on Depertment { id name } } }"
    };
}

/// Existence + discriminator probe.
pub const CONTENT_INFO: Operation = Operation {
    name: "ContentInfo",
    root_field: "contentNode",
    document: "query ContentInfo($id: ID!, $idType: ContentNodeIdTypeEnum, $asPreview: Boolean = false) { \
               contentNode(id: $id, idType: $idType, asPreview: $asPreview) { \
               databaseId contentTypeName uri status slug } }",
};

pub const PAGE_BY_ID: Operation = Operation {
    name: "PageById",
    root_field: "page",
    document: concat!(
        "query PageById($id: ID!, $idType: PageIdType = DATABASE_ID, $asPreview: Boolean = false) { ",
        "page(id: $id, idType: $idType, asPreview: $asPreview) { ",
        node_fields!(),
        seo_fields!(),
        " } }"
    ),
};

pub const POST_BY_ID: Operation = Operation {
    name: "PostById",
    root_field: "post",
    document: concat!(
        "query PostById($id: ID!, $idType: PostIdType = DATABASE_ID, $asPreview: Boolean = false) { ",
        "post(id: $id, idType: $idType, asPreview: $asPreview) { ",
        node_fields!(),
        " excerpt author { node { name description avatar { url } } }",
        seo_fields!(),
        featured_image_fields!(),
        " categories { nodes { name slug } } tags { nodes { name slug } }",
        " } }"
    ),
};

pub const JOB_BY_ID: Operation = Operation {
    name: "JobById",
    root_field: "job",
    document: concat!(
        "query JobById($id: ID!, $idType: JobIdType = DATABASE_ID, $asPreview: Boolean = false) { ",
        "job(id: $id, idType: $idType, asPreview: $asPreview) { ",
        node_fields!(),
        seo_fields!(),
        featured_image_fields!(),
        job_terms_fields!(),
        " } }"
    ),
};

pub const CASE_STUDY_BY_ID: Operation = Operation {
    name: "CaseStudyById",
    root_field: "caseStudy",
    document: concat!(
        "query CaseStudyById($id: ID!, $idType: CaseStudyIdType = DATABASE_ID, $asPreview: Boolean = false) { ",
        "caseStudy(id: $id, idType: $idType, asPreview: $asPreview) { ",
        node_fields!(),
        seo_fields!(),
        featured_image_fields!(),
        " categories { nodes { name slug } }",
        " } }"
    ),
};

pub const POST_ARCHIVE: Operation = Operation {
    name: "PostArchive",
    root_field: "posts",
    document: "query PostArchive($first: Int = 100) { \
               posts(first: $first, where: { status: PUBLISH }) { nodes { \
               id databaseId title excerpt slug date modified uri \
               author { node { name description } } } } }",
};

pub const JOB_ARCHIVE: Operation = Operation {
    name: "JobArchive",
    root_field: "jobs",
    document: concat!(
        "query JobArchive($first: Int = 100) { ",
        "jobs(first: $first, where: { status: PUBLISH }) { nodes { ",
        "id databaseId title slug date modified uri",
        featured_image_fields!(),
        job_terms_fields!(),
        " } } }"
    ),
};

pub const CASE_STUDY_ARCHIVE: Operation = Operation {
    name: "CaseStudyArchive",
    root_field: "caseStudies",
    document: concat!(
        "query CaseStudyArchive($first: Int = 100) { ",
        "caseStudies(first: $first, where: { status: PUBLISH }) { nodes { ",
        "id databaseId title slug date modified uri",
        featured_image_fields!(),
        " categories { nodes { name slug } }",
        " } } }"
    ),
};

pub const LOGIN_USER: Operation = Operation {
    name: "LoginUser",
    root_field: "login",
    document: "mutation LoginUser($username: String!, $password: String!) { \
               login(input: { clientMutationId: \"uniqueId\", username: $username, password: $password }) { \
               authToken user { id name } } }",
};

/// Minimal node lookup used when activating a preview.
pub const PREVIEW_CONTENT_NODE: Operation = Operation {
    name: "PreviewContentNode",
    root_field: "contentNode",
    document: "query PreviewContentNode($id: ID!) { \
               contentNode(id: $id, idType: DATABASE_ID) { uri status databaseId contentTypeName } }",
};
