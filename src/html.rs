//! Template → email-safe HTML.
//!
//! Output is a complete document laid out with nested tables only. Every interpolated
//! value is escaped, every URL passes a scheme allow-list, and missing props fall back to
//! their documented defaults, so compiling never fails for a well-formed template.

use std::fmt::{self, Write};
use url::Url;

use crate::block::{
    Block, ButtonProps, ColumnsProps, DividerProps, FooterProps, HeaderProps, ImageProps,
    SocialLink, SocialLinksProps, SocialPlatform, SpacerProps, Template, TextProps,
};
use crate::sanitize::{
    default_base_url, escape_html, format_width, parse_px, safe_image_url, safe_link_url,
    sanitize_rich_html, strip_px,
};
use crate::tree::{redistribute_columns, MAX_TREE_DEPTH};

/// Canonical email content width in pixels
pub const DEFAULT_CONTENT_WIDTH: u32 = 600;

pub const DEFAULT_DOCUMENT_TITLE: &str = "Email Template";

/// Ambient settings read by the compiler. No I/O happens during compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// Base that relative links and image sources are resolved against
    pub base_url: Url,
    pub content_width: u32,
    /// Substituted for image sources that are missing or rejected.
    /// `None` renders an empty placeholder box instead.
    pub placeholder_image: Option<String>,
    pub document_title: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            base_url: default_base_url().clone(),
            content_width: DEFAULT_CONTENT_WIDTH,
            placeholder_image: None,
            document_title: DEFAULT_DOCUMENT_TITLE.to_string(),
        }
    }
}

/// Compile with default options
pub fn compile(template: &Template) -> String {
    compile_with(template, &CompileOptions::default())
}

/// Compile a template into a self-contained HTML document
pub fn compile_with(template: &Template, options: &CompileOptions) -> String {
    let mut out = String::new();
    if let Err(e) = write_document(template, options, &mut out) {
        tracing::error!(error = %e, "failed to write HTML document");
    }
    out
}

fn write_document(template: &Template, options: &CompileOptions, out: &mut String) -> fmt::Result {
    let background = escape_html(template.background_color());
    let font_family = escape_html(template.font_family());
    let width = options.content_width;

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"en\">")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"UTF-8\">")?;
    writeln!(out, "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">")?;
    writeln!(out, "<title>{}</title>", escape_html(&options.document_title))?;
    writeln!(out, "</head>")?;
    writeln!(
        out,
        "<body style=\"margin: 0; padding: 0; background-color: {}; font-family: {};\">",
        background, font_family
    )?;
    writeln!(
        out,
        "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" width=\"100%\" style=\"background-color: {};\">",
        background
    )?;
    writeln!(out, "<tr>")?;
    writeln!(out, "<td align=\"center\">")?;
    writeln!(
        out,
        "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" width=\"{}\" style=\"max-width: {}px; background-color: #ffffff; margin: 0 auto;\">",
        width, width
    )?;

    let renderer = Renderer {
        options,
        font_family: &font_family,
    };
    for block in template.children() {
        renderer.block(block, out, 1)?;
    }

    writeln!(out, "</table>")?;
    writeln!(out, "</td>")?;
    writeln!(out, "</tr>")?;
    writeln!(out, "</table>")?;
    writeln!(out, "</body>")?;
    write!(out, "</html>")
}

struct Renderer<'a> {
    options: &'a CompileOptions,
    /// Already escaped
    font_family: &'a str,
}

impl Renderer<'_> {
    fn base(&self) -> &Url {
        &self.options.base_url
    }

    fn block(&self, block: &Block, out: &mut String, depth: usize) -> fmt::Result {
        if depth > MAX_TREE_DEPTH {
            tracing::warn!(id = %block.id, max_depth = MAX_TREE_DEPTH, "block nested too deep, not rendered");
            return Ok(());
        }

        use crate::block::BlockProps::*;
        match &block.props {
            Text(p) => self.text(p, out)?,
            Image(p) => self.image(p, out)?,
            Button(p) => self.button(p, out)?,
            Columns(p) => self.columns(p, block.children(), out, depth)?,
            Divider(p) => self.divider(p, out)?,
            Spacer(p) => self.spacer(p, out)?,
            Header(p) => self.header(p, out)?,
            Footer(p) => self.footer(p, out)?,
            SocialLinks(p) => self.social_links(p, out)?,
        }

        if !block.block_type().owns_children() {
            for child in block.children() {
                self.block(child, out, depth + 1)?;
            }
        }
        Ok(())
    }

    fn text(&self, p: &TextProps, out: &mut String) -> fmt::Result {
        let content = if p.is_rich_text() {
            sanitize_rich_html(p.text())
        } else {
            escape_html(p.text())
        };
        writeln!(out, "<tr>")?;
        writeln!(
            out,
            "<td align=\"{}\" style=\"padding: {}; font-family: {}; color: {}; font-size: {}; line-height: {};\">{}</td>",
            p.align().as_str(),
            escape_html(&p.padding()),
            self.font_family,
            escape_html(p.color()),
            escape_html(&p.font_size()),
            escape_html(&p.line_height()),
            content
        )?;
        writeln!(out, "</tr>")
    }

    fn placeholder_image(&self) -> Option<String> {
        self.options
            .placeholder_image
            .as_deref()
            .and_then(|url| safe_image_url(url, self.base()))
    }

    fn image(&self, p: &ImageProps, out: &mut String) -> fmt::Result {
        let src = safe_image_url(p.src(), self.base()).or_else(|| {
            tracing::debug!(src = p.src(), "image source missing or rejected, using placeholder");
            self.placeholder_image()
        });

        writeln!(out, "<tr>")?;
        writeln!(
            out,
            "<td align=\"{}\" style=\"padding: {};\">",
            p.align().as_str(),
            escape_html(&p.padding())
        )?;
        match src {
            Some(src) => writeln!(
                out,
                "<img src=\"{}\" alt=\"{}\" width=\"{}\" style=\"max-width: 100%; height: auto; display: block;\" border=\"0\" />",
                src,
                escape_html(p.alt()),
                escape_html(&format_width(p.width.as_ref()))
            )?,
            None => writeln!(
                out,
                "<div style=\"color: #9ca3af; font-size: 14px; padding: 20px; border: 1px dashed #d1d5db; text-align: center;\">{}</div>",
                escape_html(p.alt())
            )?,
        }
        writeln!(out, "</td>")?;
        writeln!(out, "</tr>")
    }

    fn button(&self, p: &ButtonProps, out: &mut String) -> fmt::Result {
        let background = escape_html(p.background_color());
        let radius = escape_html(&p.border_radius());

        writeln!(out, "<tr>")?;
        writeln!(out, "<td align=\"{}\" style=\"padding: 10px;\">", p.align().as_str())?;
        writeln!(
            out,
            "<table border=\"0\" cellspacing=\"0\" cellpadding=\"0\" width=\"{}\">",
            if p.is_full_width() { "100%" } else { "auto" }
        )?;
        writeln!(out, "<tr>")?;
        writeln!(
            out,
            "<td align=\"center\" bgcolor=\"{}\" style=\"border-radius: {};\">",
            background, radius
        )?;
        writeln!(
            out,
            "<a href=\"{}\" target=\"_blank\" style=\"padding: {}; border: 1px solid {}; border-radius: {}; font-family: {}; font-size: 16px; color: {}; text-decoration: none; display: inline-block; font-weight: bold;\">{}</a>",
            safe_link_url(p.url(), self.base()),
            escape_html(&p.padding()),
            background,
            radius,
            self.font_family,
            escape_html(p.color()),
            escape_html(p.text())
        )?;
        writeln!(out, "</td>")?;
        writeln!(out, "</tr>")?;
        writeln!(out, "</table>")?;
        writeln!(out, "</td>")?;
        writeln!(out, "</tr>")
    }

    fn columns(
        &self,
        p: &ColumnsProps,
        children: &[Block],
        out: &mut String,
        depth: usize,
    ) -> fmt::Result {
        let count = p.column_count();
        let width = 100.0 / count as f64;
        // Table layout has no `gap`: half of it becomes inner cell padding
        let half_gap = format!("{}px", parse_px(&p.gap(), 10).max(0) as f64 / 2.0);

        writeln!(out, "<tr>")?;
        writeln!(
            out,
            "<td style=\"padding: {}; background-color: {};\">",
            escape_html(&p.padding()),
            escape_html(p.background_color())
        )?;
        writeln!(
            out,
            "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" width=\"100%\" style=\"width: 100%;\">"
        )?;
        writeln!(out, "<tr>")?;

        let slices = redistribute_columns(children, count);
        let last = slices.len() - 1;
        for (i, column) in slices.iter().enumerate() {
            let left = if i == 0 { "0" } else { half_gap.as_str() };
            let right = if i == last { "0" } else { half_gap.as_str() };
            writeln!(
                out,
                "<td width=\"{w}%\" valign=\"top\" style=\"width: {w}%; padding-left: {}; padding-right: {};\">",
                left,
                right,
                w = width
            )?;
            writeln!(out, "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" width=\"100%\">")?;
            if column.is_empty() {
                writeln!(out, "<tr><td>&nbsp;</td></tr>")?;
            }
            for child in column.iter() {
                self.block(child, out, depth + 1)?;
            }
            writeln!(out, "</table>")?;
            writeln!(out, "</td>")?;
        }

        writeln!(out, "</tr>")?;
        writeln!(out, "</table>")?;
        writeln!(out, "</td>")?;
        writeln!(out, "</tr>")
    }

    fn divider(&self, p: &DividerProps, out: &mut String) -> fmt::Result {
        let height = escape_html(&p.height());
        writeln!(out, "<tr>")?;
        writeln!(out, "<td style=\"padding: {};\">", escape_html(&p.padding()))?;
        writeln!(out, "<table border=\"0\" cellspacing=\"0\" cellpadding=\"0\" width=\"100%\">")?;
        writeln!(out, "<tr>")?;
        writeln!(
            out,
            "<td height=\"{h}\" style=\"background-color: {}; height: {h}; line-height: {h}; font-size: 0;\">&nbsp;</td>",
            escape_html(p.color()),
            h = height
        )?;
        writeln!(out, "</tr>")?;
        writeln!(out, "</table>")?;
        writeln!(out, "</td>")?;
        writeln!(out, "</tr>")
    }

    fn spacer(&self, p: &SpacerProps, out: &mut String) -> fmt::Result {
        let height = escape_html(&p.height());
        writeln!(out, "<tr>")?;
        writeln!(
            out,
            "<td height=\"{h}\" style=\"height: {h}; line-height: {h}; font-size: 0;\">&nbsp;</td>",
            h = height
        )?;
        writeln!(out, "</tr>")
    }

    fn social_links(&self, p: &SocialLinksProps, out: &mut String) -> fmt::Result {
        let links = p.links();
        writeln!(out, "<tr>")?;
        writeln!(
            out,
            "<td align=\"{}\" style=\"padding: {};\">",
            p.align().as_str(),
            escape_html(&p.padding())
        )?;

        if links.is_empty() {
            writeln!(
                out,
                "<span style=\"color: #9ca3af; font-style: italic; font-size: 14px;\">Add social media links</span>"
            )?;
        }

        let spacing = parse_px(&p.spacing(), 12);
        let icon_size = p.icon_size();
        let size = escape_html(strip_px(&icon_size));
        let color = escape_html(p.icon_color());
        for (i, link) in links.iter().enumerate() {
            let margin = if i + 1 < links.len() {
                format!("margin-right: {}px; ", spacing)
            } else {
                String::new()
            };
            write!(
                out,
                "<a href=\"{}\" style=\"display: inline-block; {}text-decoration: none; vertical-align: middle;\">",
                safe_link_url(&link.url, self.base()),
                margin
            )?;
            self.social_icon(link, &size, &color, out)?;
            writeln!(out, "</a>")?;
        }

        writeln!(out, "</td>")?;
        writeln!(out, "</tr>")
    }

    fn social_icon(&self, link: &SocialLink, size: &str, color: &str, out: &mut String) -> fmt::Result {
        if link.platform == SocialPlatform::Custom {
            let icon = link
                .icon_url
                .as_deref()
                .and_then(|url| safe_image_url(url, self.base()));
            return match icon {
                Some(src) => write!(
                    out,
                    "<img src=\"{}\" alt=\"{}\" width=\"{s}\" height=\"{s}\" style=\"display: block;\" />",
                    src,
                    escape_html(link.platform.as_str()),
                    s = size
                ),
                None => {
                    tracing::debug!("custom social link without a usable icon");
                    Ok(())
                }
            };
        }
        match social_icon_path(&link.platform) {
            Some(path) => write!(
                out,
                "<svg width=\"{s}\" height=\"{s}\" viewBox=\"0 0 24 24\" fill=\"{}\" xmlns=\"http://www.w3.org/2000/svg\"><path d=\"{}\"/></svg>",
                color,
                path,
                s = size
            ),
            None => Ok(()),
        }
    }

    fn footer(&self, p: &FooterProps, out: &mut String) -> fmt::Result {
        let text_color = escape_html(p.text_color());
        writeln!(out, "<tr>")?;
        writeln!(
            out,
            "<td style=\"background-color: {}; padding: {}; color: {}; font-size: {}; line-height: 1.6;\">",
            escape_html(p.background_color()),
            escape_html(&p.padding()),
            text_color,
            escape_html(&p.font_size())
        )?;
        writeln!(out, "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" width=\"100%\">")?;

        let mut empty = true;
        if !p.company_name().is_empty() || !p.company_address().is_empty() {
            empty = false;
            writeln!(out, "<tr>")?;
            writeln!(out, "<td style=\"padding-bottom: 15px;\">")?;
            if !p.company_name().is_empty() {
                writeln!(
                    out,
                    "<div style=\"font-weight: bold; margin-bottom: 5px;\">{}</div>",
                    escape_html(p.company_name())
                )?;
            }
            if !p.company_address().is_empty() {
                writeln!(
                    out,
                    "<div style=\"margin-top: 5px;\">{}</div>",
                    escape_html(p.company_address())
                )?;
            }
            writeln!(out, "</td>")?;
            writeln!(out, "</tr>")?;
        }

        let links: Vec<(&str, &str)> = [
            (p.show_unsubscribe(), p.unsubscribe_url(), "Unsubscribe"),
            (p.show_privacy_policy(), p.privacy_policy_url(), "Privacy Policy"),
            (p.show_terms(), p.terms_url(), "Terms of Service"),
        ]
        .into_iter()
        .filter(|(shown, _, _)| *shown)
        .map(|(_, url, label)| (url, label))
        .collect();
        if !links.is_empty() {
            empty = false;
            writeln!(out, "<tr>")?;
            writeln!(out, "<td style=\"padding-bottom: 15px; line-height: 2;\">")?;
            for (i, (url, label)) in links.iter().enumerate() {
                let margin = if i + 1 < links.len() { " margin-right: 15px;" } else { "" };
                write!(
                    out,
                    "<a href=\"{}\" style=\"color: {}; text-decoration: underline;{}\">{}</a>",
                    safe_link_url(url, self.base()),
                    text_color,
                    margin,
                    label
                )?;
            }
            writeln!(out)?;
            writeln!(out, "</td>")?;
            writeln!(out, "</tr>")?;
        }

        if !p.copyright_text().is_empty() {
            empty = false;
            writeln!(out, "<tr>")?;
            writeln!(
                out,
                "<td style=\"margin-top: 15px; font-size: 11px; opacity: 0.8;\">{}</td>",
                escape_html(p.copyright_text())
            )?;
            writeln!(out, "</tr>")?;
        }

        if empty {
            writeln!(out, "<tr>")?;
            writeln!(
                out,
                "<td style=\"color: #9ca3af; font-style: italic; font-size: 14px; padding: 10px; border: 1px dashed #d1d5db; border-radius: 4px; text-align: center;\">Configure footer content</td>"
            )?;
            writeln!(out, "</tr>")?;
        }

        writeln!(out, "</table>")?;
        writeln!(out, "</td>")?;
        writeln!(out, "</tr>")
    }

    fn header(&self, p: &HeaderProps, out: &mut String) -> fmt::Result {
        let align = p.align().as_str();
        let logo = safe_image_url(p.logo_url(), self.base());
        if logo.is_none() && !p.logo_url().is_empty() {
            tracing::debug!(logo_url = p.logo_url(), "header logo rejected");
        }

        writeln!(out, "<tr>")?;
        writeln!(
            out,
            "<td style=\"background-color: {}; padding: {};\">",
            escape_html(p.background_color()),
            escape_html(&p.padding())
        )?;
        writeln!(out, "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" width=\"100%\">")?;
        writeln!(out, "<tr>")?;

        if let Some(src) = &logo {
            let logo_height = p.logo_height();
            let height = if logo_height == "auto" {
                "height: auto;".to_string()
            } else {
                format!("height: {};", escape_html(&logo_height))
            };
            writeln!(out, "<td align=\"{}\" style=\"vertical-align: middle;\">", align)?;
            writeln!(
                out,
                "<img src=\"{}\" alt=\"{}\" width=\"{}\" style=\"max-width: 100%; {} display: block;\" border=\"0\" />",
                src,
                escape_html(p.logo_alt()),
                escape_html(strip_px(&p.logo_width())),
                height
            )?;
            writeln!(out, "</td>")?;
        }

        if p.has_menu() {
            let menu_align = if logo.is_some() { "right" } else { align };
            writeln!(out, "<td align=\"{}\" style=\"vertical-align: middle;\">", menu_align)?;
            for item in p.menu_items() {
                write!(
                    out,
                    "<a href=\"{}\" style=\"color: #333333; text-decoration: none; font-size: 14px; font-weight: 500; margin-right: 15px;\">{}</a>",
                    safe_link_url(&item.url, self.base()),
                    escape_html(&item.label)
                )?;
            }
            writeln!(out)?;
            writeln!(out, "</td>")?;
        }

        if logo.is_none() && !p.has_menu() {
            writeln!(
                out,
                "<td align=\"center\" style=\"color: #9ca3af; font-style: italic; font-size: 14px; padding: 10px; border: 1px dashed #d1d5db; border-radius: 4px;\">Configure header content</td>"
            )?;
        }

        writeln!(out, "</tr>")?;
        writeln!(out, "</table>")?;
        writeln!(out, "</td>")?;
        writeln!(out, "</tr>")
    }
}

/// 24×24 path data for the built-in platform icons
fn social_icon_path(platform: &SocialPlatform) -> Option<&'static str> {
    match platform {
        SocialPlatform::Facebook => Some("M24 12.073c0-6.627-5.373-12-12-12s-12 5.373-12 12c0 5.99 4.388 10.954 10.125 11.854v-8.385H7.078v-3.47h3.047V9.43c0-3.007 1.792-4.669 4.533-4.669 1.312 0 2.686.235 2.686.235v2.953H15.83c-1.491 0-1.956.925-1.956 1.874v2.25h3.328l-.532 3.47h-2.796v8.385C19.612 23.027 24 18.062 24 12.073z"),
        SocialPlatform::X => Some("M18.244 2.25h3.308l-7.227 8.26 8.502 11.24H16.17l-5.214-6.817L4.99 21.75H1.68l7.73-8.835L1.254 2.25H8.08l4.713 6.231zm-1.161 17.52h1.833L7.084 4.126H5.117z"),
        SocialPlatform::Instagram => Some("M12 2.163c3.204 0 3.584.012 4.85.07 3.252.148 4.771 1.691 4.919 4.919.058 1.265.069 1.645.069 4.849 0 3.205-.012 3.584-.069 4.849-.149 3.225-1.664 4.771-4.919 4.919-1.266.058-1.644.07-4.85.07-3.204 0-3.584-.012-4.849-.07-3.26-.149-4.771-1.699-4.919-4.92-.058-1.265-.07-1.644-.07-4.849 0-3.204.013-3.583.07-4.849.149-3.227 1.664-4.771 4.919-4.919 1.266-.057 1.645-.069 4.849-.069zm0-2.163c-3.259 0-3.667.014-4.947.072-4.358.2-6.78 2.618-6.98 6.98-.059 1.281-.073 1.689-.073 4.948 0 3.259.014 3.668.072 4.948.2 4.358 2.618 6.78 6.98 6.98 1.281.058 1.689.072 4.948.072 3.259 0 3.668-.014 4.948-.072 4.354-.2 6.782-2.618 6.979-6.98.059-1.28.073-1.689.073-4.948 0-3.259-.014-3.667-.072-4.947-.196-4.354-2.617-6.78-6.979-6.98-1.281-.059-1.69-.073-4.949-.073zm0 5.838c-3.403 0-6.162 2.759-6.162 6.162s2.759 6.163 6.162 6.163 6.162-2.759 6.162-6.163c0-3.403-2.759-6.162-6.162-6.162zm0 10.162c-2.209 0-4-1.79-4-4 0-2.209 1.791-4 4-4s4 1.791 4 4c0 2.21-1.791 4-4 4zm6.406-11.845c-.796 0-1.441.645-1.441 1.44s.645 1.44 1.441 1.44c.795 0 1.439-.645 1.439-1.44s-.644-1.44-1.439-1.44z"),
        SocialPlatform::Linkedin => Some("M20.447 20.452h-3.554v-5.569c0-1.328-.027-3.037-1.852-3.037-1.853 0-2.136 1.445-2.136 2.939v5.667H9.351V9h3.414v1.561h.046c.477-.9 1.637-1.85 3.37-1.85 3.601 0 4.267 2.37 4.267 5.455v6.286zM5.337 7.433c-1.144 0-2.063-.926-2.063-2.065 0-1.138.92-2.063 2.063-2.063 1.14 0 2.064.925 2.064 2.063 0 1.139-.925 2.065-2.064 2.065zm1.782 13.019H3.555V9h3.564v11.452zM22.225 0H1.771C.792 0 0 .774 0 1.729v20.542C0 23.227.792 24 1.771 24h20.451C23.2 24 24 23.227 24 22.271V1.729C24 .774 23.2 0 22.222 0h.003z"),
        SocialPlatform::Youtube => Some("M23.498 6.186a3.016 3.016 0 0 0-2.122-2.136C19.505 3.545 12 3.545 12 3.545s-7.505 0-9.377.505A3.017 3.017 0 0 0 .502 6.186C0 8.07 0 12 0 12s0 3.93.502 5.814a3.016 3.016 0 0 0 2.122 2.136c1.871.505 9.376.505 9.376.505s7.505 0 9.377-.505a3.015 3.015 0 0 0 2.122-2.136C24 15.93 24 12 24 12s0-3.93-.502-5.814zM9.545 15.568V8.432L15.818 12l-6.273 3.568z"),
        SocialPlatform::Custom | SocialPlatform::Other(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Align, BlockProps, BlockType, Length, MenuItem};

    fn block(id: &str, props: BlockProps) -> Block {
        Block::with_id(id, props)
    }

    /// Markup between the opening of the content table and its closing tag
    fn content(html: &str) -> &str {
        let start = html.find("margin: 0 auto;\">").unwrap() + "margin: 0 auto;\">".len();
        let end = html.rfind("</table>\n</td>\n</tr>\n</table>").unwrap();
        &html[start..end]
    }

    #[test]
    fn test_simple_text_export() {
        let t = Template::with_children(vec![block("t", BlockProps::Text(TextProps::plain("Hi")))]);
        let html = compile(&t);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.ends_with("</html>"));
        assert!(html.contains("background-color: #ffffff; font-family: sans-serif;"));
        let body = content(&html);
        assert_eq!(body.matches("<tr>").count(), 1);
        assert!(body.contains(";\">Hi</td>"));
    }

    #[test]
    fn test_plain_text_is_escaped() {
        let t = Template::with_children(vec![block(
            "t",
            BlockProps::Text(TextProps::plain("<script>x</script>")),
        )]);
        let html = compile(&t);
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_rich_text_passes_sanitized() {
        let t = Template::with_children(vec![block(
            "t",
            BlockProps::Text(TextProps::rich("<p>Hello <strong>you</strong></p><script>x</script>")),
        )]);
        let html = compile(&t);
        assert!(html.contains(";\"><p>Hello <strong>you</strong></p></td>"));
        assert!(!html.contains("script"));
    }

    #[test]
    fn test_rich_text_link_schemes_checked() {
        let t = Template::with_children(vec![
            block("a", BlockProps::Text(TextProps::rich(r#"<a href="javascript&#58;alert(1)">x</a>"#))),
            block("b", BlockProps::Text(TextProps::rich(r#"<a href="data:text/html;base64,PGI+">y</a>"#))),
            block("c", BlockProps::Text(TextProps::rich(r#"<a href="mailto:hi@acme.test">z</a>"#))),
        ]);
        let html = compile(&t);
        assert!(!html.contains("javascript"));
        assert!(!html.contains("data:text/html"));
        assert!(html.contains(r#"href="mailto:hi@acme.test""#));
    }

    #[test]
    fn test_invalid_button_url_falls_back() {
        let t = Template::with_children(vec![block(
            "b",
            BlockProps::Button(ButtonProps {
                url: Some("javascript:alert(1)".into()),
                width: Some("full".into()),
                ..Default::default()
            }),
        )]);
        let html = compile(&t);
        assert!(html.contains("href=\"#\""));
        assert!(!html.contains("javascript"));
        assert!(html.contains("width=\"100%\">"));
        assert!(html.contains(">Click Me</a>"));
    }

    #[test]
    fn test_image_width_and_placeholder() {
        let good = block(
            "i",
            BlockProps::Image(ImageProps {
                src: Some("https://cdn.example.com/a.png".into()),
                width: Some(Length::from("50%")),
                ..Default::default()
            }),
        );
        let html = compile(&Template::with_children(vec![good]));
        assert!(html.contains("<img src=\"https://cdn.example.com/a.png\" alt=\"Image\" width=\"50\""));

        let bad = block(
            "i",
            BlockProps::Image(ImageProps {
                src: Some("javascript:alert(1)".into()),
                ..Default::default()
            }),
        );
        let t = Template::with_children(vec![bad]);
        let html = compile(&t);
        assert!(!html.contains("<img"));
        assert!(html.contains("dashed"));

        let options = CompileOptions {
            placeholder_image: Some("https://example.com/placeholder.png".into()),
            ..Default::default()
        };
        let html = compile_with(&t, &options);
        assert!(html.contains("<img src=\"https://example.com/placeholder.png\""));
    }

    #[test]
    fn test_columns_split() {
        let kids: Vec<Block> = (0..5)
            .map(|i| block(&format!("t{}", i), BlockProps::Text(TextProps::plain(format!("item{}", i)))))
            .collect();
        let cols = block("c", BlockProps::Columns(ColumnsProps::default())).with_children(kids);
        let html = compile(&Template::with_children(vec![cols]));

        let cells: Vec<&str> = html.split("valign=\"top\"").skip(1).collect();
        assert_eq!(cells.len(), 2);
        assert!(cells[0].contains("item0") && cells[0].contains("item2"));
        assert!(!cells[0].contains("item3"));
        assert!(cells[1].contains("item3") && cells[1].contains("item4"));
        assert!(html.contains("width=\"50%\" valign=\"top\" style=\"width: 50%; padding-left: 0; padding-right: 5px;\""));
        assert!(html.contains("style=\"width: 50%; padding-left: 5px; padding-right: 0;\""));
    }

    #[test]
    fn test_columns_three_way_width_and_empty_cells() {
        let cols = block(
            "c",
            BlockProps::Columns(ColumnsProps {
                column_count: Some(3.0),
                gap: Some(Length::from("15px")),
                ..Default::default()
            }),
        );
        let html = compile(&Template::with_children(vec![cols]));
        assert!(html.contains("width=\"33.333333333333336%\""));
        assert!(html.contains("padding-left: 7.5px; padding-right: 7.5px;"));
        assert_eq!(html.matches("<tr><td>&nbsp;</td></tr>").count(), 3);
    }

    #[test]
    fn test_negative_gap_gives_no_padding() {
        let t = Template::with_children(vec![block(
            "c",
            BlockProps::Columns(ColumnsProps {
                gap: Some(Length::from("-10px")),
                ..Default::default()
            }),
        )
        .with_children(vec![block("a", BlockProps::Text(TextProps::plain("a")))])]);
        let html = compile(&t);
        assert!(!html.contains("-5px"));
        assert!(html.contains("style=\"width: 50%; padding-left: 0; padding-right: 0px;\""));
        assert!(html.contains("style=\"width: 50%; padding-left: 0px; padding-right: 0;\""));
    }

    #[test]
    fn test_generic_children_follow_their_row() {
        let spacer = block("s", BlockProps::Spacer(SpacerProps::default()))
            .with_children(vec![block("t", BlockProps::Text(TextProps::plain("after")))]);
        let html = compile(&Template::with_children(vec![spacer]));
        let spacer_at = html.find("height=\"20px\"").unwrap();
        let text_at = html.find("after").unwrap();
        assert!(spacer_at < text_at);
    }

    #[test]
    fn test_owned_children_not_rendered_generically() {
        let footer = block("f", BlockProps::empty(BlockType::Footer))
            .with_children(vec![block("t", BlockProps::Text(TextProps::plain("hidden")))]);
        let html = compile(&Template::with_children(vec![footer]));
        assert!(!html.contains("hidden"));
    }

    #[test]
    fn test_divider_and_spacer() {
        let t = Template::with_children(vec![
            block("d", BlockProps::empty(BlockType::Divider)),
            block("s", BlockProps::Spacer(SpacerProps { height: Some(Length::Number(32.0)), ..Default::default() })),
        ]);
        let html = compile(&t);
        assert!(html.contains("<td height=\"1px\" style=\"background-color: #cccccc; height: 1px; line-height: 1px; font-size: 0;\">&nbsp;</td>"));
        assert!(html.contains("<td height=\"32px\" style=\"height: 32px; line-height: 32px; font-size: 0;\">&nbsp;</td>"));
    }

    #[test]
    fn test_social_links() {
        let props = SocialLinksProps {
            links: Some(vec![
                SocialLink { platform: SocialPlatform::Facebook, url: "https://facebook.com/x".into(), icon_url: None },
                SocialLink { platform: SocialPlatform::X, url: "javascript:void(0)".into(), icon_url: None },
                SocialLink {
                    platform: SocialPlatform::Custom,
                    url: "https://example.org".into(),
                    icon_url: Some("https://example.org/icon.png".into()),
                },
            ]),
            icon_size: Some(Length::from("32px")),
            ..Default::default()
        };
        let html = compile(&Template::with_children(vec![block("s", BlockProps::SocialLinks(props))]));
        assert_eq!(html.matches("margin-right: 12px;").count(), 2);
        assert_eq!(html.matches("<svg width=\"32\" height=\"32\"").count(), 2);
        assert!(html.contains("fill=\"#333333\""));
        assert!(html.contains("<a href=\"#\""));
        assert!(html.contains("<img src=\"https://example.org/icon.png\" alt=\"custom\" width=\"32\" height=\"32\""));
    }

    #[test]
    fn test_social_link_unknown_platform_renders_empty_link() {
        let props = SocialLinksProps {
            links: Some(vec![SocialLink {
                platform: SocialPlatform::from("tiktok".to_string()),
                url: "https://tiktok.com/@acme".into(),
                icon_url: None,
            }]),
            ..Default::default()
        };
        let html = compile(&Template::with_children(vec![block("s", BlockProps::SocialLinks(props))]));
        assert!(html.contains("<a href=\"https://tiktok.com/@acme\" style=\"display: inline-block; text-decoration: none; vertical-align: middle;\"></a>"));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn test_social_links_empty_state() {
        let html = compile(&Template::with_children(vec![block("s", BlockProps::empty(BlockType::SocialLinks))]));
        assert!(html.contains("Add social media links"));
    }

    #[test]
    fn test_footer() {
        let props = FooterProps {
            company_name: Some("Acme & Co".into()),
            unsubscribe_url: Some("vbscript:x".into()),
            privacy_policy_url: Some("https://acme.test/privacy".into()),
            show_terms: Some(false),
            copyright_text: Some("© 2026 Acme".into()),
            ..Default::default()
        };
        let html = compile(&Template::with_children(vec![block("f", BlockProps::Footer(props))]));
        assert!(html.contains(">Acme &amp; Co</div>"));
        assert!(html.contains("<a href=\"#\" style=\"color: #666666; text-decoration: underline; margin-right: 15px;\">Unsubscribe</a>"));
        assert!(html.contains("<a href=\"https://acme.test/privacy\" style=\"color: #666666; text-decoration: underline;\">Privacy Policy</a>"));
        assert!(!html.contains("Terms of Service"));
        assert!(html.contains("© 2026 Acme"));
    }

    #[test]
    fn test_footer_empty_state() {
        let props = FooterProps {
            show_unsubscribe: Some(false),
            show_privacy_policy: Some(false),
            show_terms: Some(false),
            ..Default::default()
        };
        let html = compile(&Template::with_children(vec![block("f", BlockProps::Footer(props))]));
        assert!(html.contains("Configure footer content"));
    }

    #[test]
    fn test_header_logo_and_menu() {
        let props = HeaderProps {
            logo_url: Some("https://acme.test/logo.png".into()),
            show_menu: Some(true),
            menu_items: Some(vec![
                MenuItem { label: "Shop".into(), url: "https://acme.test/shop".into() },
                MenuItem { label: "Bad".into(), url: "javascript:x".into() },
            ]),
            align: Some(Align::Center),
            ..Default::default()
        };
        let html = compile(&Template::with_children(vec![block("h", BlockProps::Header(props))]));
        assert!(html.contains("width=\"150\" style=\"max-width: 100%; height: auto; display: block;\""));
        assert!(html.contains("<td align=\"right\" style=\"vertical-align: middle;\">"));
        assert!(html.contains(">Shop</a>"));
        assert!(html.contains("<a href=\"#\""));
        assert!(!html.contains("Configure header content"));
    }

    #[test]
    fn test_header_placeholder() {
        let html = compile(&Template::with_children(vec![block("h", BlockProps::empty(BlockType::Header))]));
        assert!(html.contains("Configure header content"));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let t = Template::with_children(vec![
            block("t", BlockProps::Text(TextProps::plain("a"))),
            block("b", BlockProps::empty(BlockType::Button)),
        ]);
        assert_eq!(compile(&t), compile(&t));
    }

    #[test]
    fn test_options_width_and_title() {
        let options = CompileOptions {
            content_width: 640,
            document_title: "Hello <there>".into(),
            ..Default::default()
        };
        let html = compile_with(&Template::new(), &options);
        assert!(html.contains("width=\"640\" style=\"max-width: 640px;"));
        assert!(html.contains("<title>Hello &lt;there&gt;</title>"));
    }
}
