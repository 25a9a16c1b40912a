//! Sitemap entry model.

use chrono::NaiveDate;
use quick_xml::escape::escape;

/// One `<url>` element of a sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: String,
    pub changefreq: String,
    pub priority: String,
}

impl SitemapEntry {
    pub fn new(
        loc: impl Into<String>,
        lastmod: NaiveDate,
        changefreq: impl Into<String>,
        priority: impl Into<String>,
    ) -> Self {
        Self {
            loc: loc.into(),
            lastmod: lastmod.format("%Y-%m-%d").to_string(),
            changefreq: changefreq.into(),
            priority: priority.into(),
        }
    }

    /// Render as an indented `<url>` block, one child per line.
    ///
    /// `indent` is the leading whitespace of the `<url>` line; children get
    /// two more spaces.
    pub fn to_fragment(&self, indent: &str) -> String {
        format!(
            "{indent}<url>\n\
             {indent}  <loc>{}</loc>\n\
             {indent}  <lastmod>{}</lastmod>\n\
             {indent}  <changefreq>{}</changefreq>\n\
             {indent}  <priority>{}</priority>\n\
             {indent}</url>\n",
            escape(self.loc.as_str()),
            escape(self.lastmod.as_str()),
            escape(self.changefreq.as_str()),
            escape(self.priority.as_str()),
        )
    }
}
