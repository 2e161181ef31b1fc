//! HTML inspection and rewriting for in-memory documents.

use std::{cell::RefCell, rc::Rc};

use lol_html::{RewriteStrSettings, element, html_content::ContentType, rewrite_str};

use super::{options::Options, types::RenderError};

/// Collect `<meta name="{prefix}NAME" content="VALUE">` tags as options.
///
/// Tags are picked up anywhere in the document, so markup without a
/// `<head>` still contributes its options. Tags whose name lacks the prefix
/// or that carry no `content` attribute are ignored.
pub fn scan_meta_options(markup: &str, prefix: &str) -> Result<Options, RenderError> {
    let found = Rc::new(RefCell::new(Options::new()));

    rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![element!("meta[name]", {
                let found = Rc::clone(&found);
                move |el| {
                    let Some(name) = el.get_attribute("name") else {
                        return Ok(());
                    };
                    let Some(option) = name.strip_prefix(prefix) else {
                        return Ok(());
                    };
                    if option.is_empty() {
                        return Ok(());
                    }
                    if let Some(content) = el.get_attribute("content") {
                        found.borrow_mut().insert(option, content);
                    }
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Markup(err.to_string()))?;

    Ok(found.take())
}

/// Wrap stylesheet contents in a single `<style>` element.
pub fn style_block(stylesheets: &[String]) -> String {
    format!("<style>{}</style>", stylesheets.join("\n"))
}

/// Insert one `<style>` block right after the opening `<head>` tag, or at
/// the very start of the document when there is no `<head>`.
pub fn inject_stylesheets(markup: &str, stylesheets: &[String]) -> Result<String, RenderError> {
    let block = style_block(stylesheets);
    let injected = Rc::new(RefCell::new(false));

    let rewritten = rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![element!("head", {
                let injected = Rc::clone(&injected);
                let block = block.clone();
                move |el| {
                    let mut injected = injected.borrow_mut();
                    if !*injected {
                        el.prepend(&block, ContentType::Html);
                        *injected = true;
                    }
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Markup(err.to_string()))?;

    if injected.take() {
        Ok(rewritten)
    } else {
        Ok(format!("{block}{markup}"))
    }
}
