//! Markdown code-fence handling for model output.
//!
//! Models often wrap JSON in a fenced block, sometimes after a line of prose.
//! The accepted shape is line oriented:
//!
//! ```text
//! opening := ws* "```" "`"* tag? ws* (info newline | body-start)
//! tag     := [A-Za-z0-9_+.-]*
//! body    := any text, from body-start ("{" or "[") or the next line
//! closing := ws* "```" "`"* ws* (newline | end)    (at least as long as opening)
//! ```
//!
//! Backticks inside the body only end the block when they form a closing line
//! of their own, so markup containing literal backtick runs is not truncated.

/// A fenced block found in a model response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence<'a> {
    /// Language tag after the opening backticks, possibly empty.
    pub tag: &'a str,
    /// Text between the opening and closing lines.
    pub body: &'a str,
    /// Whether a closing fence was found.
    pub closed: bool,
}

struct Opening<'a> {
    ticks: usize,
    tag: &'a str,
    body_start: usize,
}

/// Locate the payload block: a `json`-tagged fence if there is one, otherwise
/// the first fence of any kind.
pub fn find_fence(text: &str) -> Option<Fence<'_>> {
    let openings = openings(text);
    let opening = openings
        .iter()
        .find(|o| o.tag.eq_ignore_ascii_case("json"))
        .or_else(|| openings.first())?;

    Some(close(text, opening))
}

/// The text to hand to the JSON parser: the fenced body when a fence is
/// present, otherwise the whole response. Surrounding whitespace is trimmed.
pub fn extract_payload(text: &str) -> &str {
    match find_fence(text) {
        Some(fence) => fence.body.trim(),
        None => text.trim(),
    }
}

fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split_inclusive('\n').scan(0usize, |offset, line| {
        let start = *offset;
        *offset += line.len();
        Some((start, line))
    })
}

fn leading_ticks(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b'`').count()
}

fn openings(text: &str) -> Vec<Opening<'_>> {
    lines_with_offsets(text)
        .filter_map(|(start, line)| {
            let trimmed = line.trim_start();
            let ticks = leading_ticks(trimmed);
            if ticks < 3 {
                return None;
            }
            let after_ticks = &trimmed[ticks..];
            let tag_len = after_ticks
                .bytes()
                .take_while(|&b| b.is_ascii_alphanumeric() || b"_+.-".contains(&b))
                .count();
            let tag = &after_ticks[..tag_len];
            let info = after_ticks[tag_len..].trim_start();

            if info.starts_with('{') || info.starts_with('[') {
                // Body begins on the opening line.
                let offset = line.len() - info.len();
                return Some(Opening {
                    ticks,
                    tag,
                    body_start: start + offset,
                });
            }
            if info.contains('`') {
                return None;
            }
            Some(Opening {
                ticks,
                tag,
                body_start: start + line.len(),
            })
        })
        .collect()
}

fn close<'a>(text: &'a str, opening: &Opening<'a>) -> Fence<'a> {
    let rest = &text[opening.body_start..];

    for (start, line) in lines_with_offsets(rest) {
        let trimmed = line.trim();
        let ticks = leading_ticks(trimmed);
        if ticks >= opening.ticks && ticks == trimmed.len() {
            return Fence {
                tag: opening.tag,
                body: &rest[..start],
                closed: true,
            };
        }
    }

    // No closing line: accept a fence glued to the end of the last line.
    let trimmed = rest.trim_end();
    let trailing = trimmed.bytes().rev().take_while(|&b| b == b'`').count();
    if trailing >= opening.ticks {
        return Fence {
            tag: opening.tag,
            body: &trimmed[..trimmed.len() - trailing],
            closed: true,
        };
    }

    Fence {
        tag: opening.tag,
        body: rest,
        closed: false,
    }
}
