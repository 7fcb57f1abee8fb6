use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter, Serializer};
use std::io;

/// Tab-indented JSON whose strings are safe to embed in HTML: `<`, `>`, `&`,
/// U+2028 and U+2029 are written as `\uXXXX` escapes.
pub struct HtmlSafeFormatter<'a> {
    pretty: PrettyFormatter<'a>,
}

impl<'a> HtmlSafeFormatter<'a> {
    pub fn new() -> Self {
        HtmlSafeFormatter {
            pretty: PrettyFormatter::with_indent(b"\t"),
        }
    }
}

impl Default for HtmlSafeFormatter<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn html_escape(ch: char) -> Option<&'static str> {
    match ch {
        '<' => Some("\\u003c"),
        '>' => Some("\\u003e"),
        '&' => Some("\\u0026"),
        '\u{2028}' => Some("\\u2028"),
        '\u{2029}' => Some("\\u2029"),
        _ => None,
    }
}

impl Formatter for HtmlSafeFormatter<'_> {
    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_array(writer)
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_object(writer)
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.end_object_value(writer)
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if let Some(escape) = html_escape(ch) {
                writer.write_all(fragment[start..idx].as_bytes())?;
                writer.write_all(escape.as_bytes())?;
                start = idx + ch.len_utf8();
            }
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

pub fn to_vec_html_safe<T>(value: &T) -> serde_json::Result<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    let mut out = Vec::with_capacity(256);
    let mut serializer = Serializer::with_formatter(&mut out, HtmlSafeFormatter::new());
    value.serialize(&mut serializer)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &serde_json::Value) -> String {
        String::from_utf8(to_vec_html_safe(value).unwrap()).unwrap()
    }

    #[test]
    fn test_escapes_html_characters() {
        let out = render(&json!("/text?tag=ReproC&x=1 <b> \u{2028}"));
        assert_eq!(out, r#""/text?tag=ReproC\u0026x=1 \u003cb\u003e \u2028""#);
    }

    #[test]
    fn test_regular_escapes_still_apply() {
        let out = render(&json!("quote \" and \\ and\nnewline"));
        assert_eq!(out, r#""quote \" and \\ and\nnewline""#);
    }

    #[test]
    fn test_tab_indent() {
        let out = render(&json!({"a": [1, 2], "b": null, "c": []}));
        assert_eq!(out, "{\n\t\"a\": [\n\t\t1,\n\t\t2\n\t],\n\t\"b\": null,\n\t\"c\": []\n}");
    }
}
