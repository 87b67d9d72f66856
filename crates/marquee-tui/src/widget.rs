use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Paragraph, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Single-line marquee.
///
/// While animating, the text is shifted left by `-offset` columns. Otherwise
/// it is drawn statically and truncated with an ellipsis if it overflows.
pub struct MarqueeWidget<'a> {
    text: &'a str,
    offset: f64,
    animating: bool,
    style: Style,
    block: Option<Block<'a>>,
}

impl<'a> MarqueeWidget<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            offset: 0.0,
            animating: false,
            style: Style::default(),
            block: None,
        }
    }

    /// Current controller offset and animating flag
    pub fn offset(mut self, offset: f64, animating: bool) -> Self {
        self.offset = offset;
        self.animating = animating;
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for MarqueeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };
        if inner.is_empty() {
            return;
        }

        if self.animating {
            let shift = (-self.offset).round().clamp(0.0, u16::MAX as f64) as u16;
            Paragraph::new(self.text)
                .style(self.style)
                .scroll((0, shift))
                .render(inner, buf);
        } else {
            let text = truncate_to_width(self.text, inner.width as usize);
            Paragraph::new(text).style(self.style).render(inner, buf);
        }
    }
}

/// Fit `text` into `width` columns, ending with `…` when cut
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let budget = width - 1;
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(widget: MarqueeWidget, width: u16) -> Buffer {
        let area = Rect::new(0, 0, width, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        buf
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("exactly", 7), "exactly");
        assert_eq!(truncate_to_width("hello world", 6), "hello…");
        assert_eq!(truncate_to_width("hello", 0), "");
        // A wide glyph that does not fit is dropped whole
        assert_eq!(truncate_to_width("ab日本", 4), "ab…");
    }

    #[test]
    fn test_static_render_truncates() {
        let buf = render(MarqueeWidget::new("hello world"), 8);
        assert_eq!(buf, Buffer::with_lines(["hello w…"]));
    }

    #[test]
    fn test_static_render_fits() {
        let buf = render(MarqueeWidget::new("hi"), 5);
        assert_eq!(buf, Buffer::with_lines(["hi   "]));
    }

    #[test]
    fn test_animated_render_shifts_left() {
        let widget = MarqueeWidget::new("hello world").offset(-3.0, true);
        let buf = render(widget, 5);
        assert_eq!(buf, Buffer::with_lines(["lo wo"]));
    }

    #[test]
    fn test_animated_render_at_end() {
        let widget = MarqueeWidget::new("hello world").offset(-6.0, true);
        let buf = render(widget, 5);
        assert_eq!(buf, Buffer::with_lines(["world"]));
    }

    #[test]
    fn test_zero_sized_area() {
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        MarqueeWidget::new("text").render(area, &mut buf);
    }
}
