//! Shareable link formats.
//!
//! Each uploaded image can be exported as a plain URL or wrapped in the
//! markup of the target medium.

/// Output format for a shareable link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFormat {
    Direct,
    Markdown,
    Html,
    BbCode,
}

impl LinkFormat {
    pub fn parse(s: &str) -> Result<Self, anyhow::Error> {
        match s.to_lowercase().as_str() {
            "direct" => Ok(LinkFormat::Direct),
            "markdown" | "md" => Ok(LinkFormat::Markdown),
            "html" => Ok(LinkFormat::Html),
            "bbcode" => Ok(LinkFormat::BbCode),
            _ => Err(anyhow::anyhow!("Invalid link format: {}", s)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LinkFormat::Direct => "Direct Link",
            LinkFormat::Markdown => "Markdown",
            LinkFormat::Html => "HTML",
            LinkFormat::BbCode => "BBCode",
        }
    }

    /// Render a URL in this format.
    pub fn render(self, url: &str) -> String {
        match self {
            LinkFormat::Direct => url.to_string(),
            LinkFormat::Markdown => format!("![image]({})", url),
            LinkFormat::Html => format!("<img src=\"{}\" alt=\"image\" />", url),
            LinkFormat::BbCode => format!("[img]{}[/img]", url),
        }
    }
}

pub const ALL_FORMATS: [LinkFormat; 4] = [
    LinkFormat::Direct,
    LinkFormat::Markdown,
    LinkFormat::Html,
    LinkFormat::BbCode,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_all_formats() {
        let url = "https://i.example.com/a.png";
        assert_eq!(LinkFormat::Direct.render(url), url);
        assert_eq!(
            LinkFormat::Markdown.render(url),
            "![image](https://i.example.com/a.png)"
        );
        assert_eq!(
            LinkFormat::Html.render(url),
            "<img src=\"https://i.example.com/a.png\" alt=\"image\" />"
        );
        assert_eq!(
            LinkFormat::BbCode.render(url),
            "[img]https://i.example.com/a.png[/img]"
        );
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(LinkFormat::parse("Markdown").unwrap(), LinkFormat::Markdown);
        assert_eq!(LinkFormat::parse("BBCODE").unwrap(), LinkFormat::BbCode);
        assert!(LinkFormat::parse("textile").is_err());
    }
}
