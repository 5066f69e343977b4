/// Default width for wrapped report paragraphs.
pub(crate) const WRAP_WIDTH: usize = 70;

/// Wrap each blank-line separated paragraph of `text` to `width` columns.
///
/// Whitespace inside a paragraph collapses to single spaces. Words longer
/// than `width` get a line of their own rather than being split.
pub(crate) fn wrap_paragraphs(text: &str, width: usize) -> String {
    text.split("\n\n")
        .map(|paragraph| wrap(paragraph, width))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn wrap(paragraph: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in paragraph.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}
