//! Forward-only pull reader.
//!
//! Wraps a `quick_xml::Reader` and exposes exactly one operation:
//! scan forward to the next occurrence of the record tag and
//! materialize that element's subtree into an [`Element`]. Everything
//! between records is discarded as it is read, so the working set is
//! bounded by one record's subtree.
//!
//! Recovery is lenient: parser errors are skipped as long as the
//! reader keeps making byte progress. A stuck reader surfaces as
//! [`MalformedInputError`].

use std::io::BufRead;

use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error_handling::MalformedInputError;
use crate::parse::node::Element;

/// Pull reader over a byte stream (file or stdin).
pub struct PullReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    skipped: u64,
    last_error_pos: Option<u64>,
}

impl<R: BufRead> PullReader<R> {
    /// Creates a reader in lenient mode: mismatched and unmatched end
    /// tags are tolerated so a recovery pass can skip bad fragments.
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        PullReader {
            reader,
            buf: Vec::new(),
            skipped: 0,
            last_error_pos: None,
        }
    }

    /// Number of unparsable fragments skipped so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Scans forward to the next start of `tag` and materializes its
    /// subtree. Returns `Ok(None)` at end of input.
    ///
    /// The subtree's events are consumed while materializing, so the
    /// next call resumes after the record.
    pub fn next_record(&mut self, tag: &str) -> Result<Option<Element>, MalformedInputError> {
        loop {
            self.buf.clear();
            let decoder = self.reader.decoder();
            match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(start)) if name_matches(&start, tag) => {
                    let root = element_from_start(&start, decoder);
                    match self.expand(root) {
                        Ok(element) => return Ok(Some(element)),
                        Err(e) => self.note_recoverable(e)?,
                    }
                }
                Ok(Event::Empty(start)) if name_matches(&start, tag) => {
                    return Ok(Some(element_from_start(&start, decoder)));
                }
                Ok(Event::Eof) => return Ok(None),
                Ok(_) => {}
                Err(e) => self.note_recoverable(e)?,
            }
        }
    }

    /// Materializes the subtree of an already-consumed start tag using
    /// an explicit element stack (no call recursion, arbitrarily deep
    /// nesting is fine).
    fn expand(&mut self, root: Element) -> Result<Element, quick_xml::Error> {
        let mut stack = vec![root];
        loop {
            self.buf.clear();
            let decoder = self.reader.decoder();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(start) => {
                    let element = element_from_start(&start, decoder);
                    stack.push(element);
                }
                Event::Empty(start) => {
                    let element = element_from_start(&start, decoder);
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(element);
                    }
                }
                Event::Text(text) => {
                    let chunk = text
                        .unescape()
                        .map(|c| c.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(text.as_ref()).into_owned());
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&chunk);
                    }
                }
                Event::CData(cdata) => {
                    let chunk = decode_lossy(cdata.as_ref(), decoder);
                    if let Some(top) = stack.last_mut() {
                        top.text.push_str(&chunk);
                    }
                }
                Event::End(_) => {
                    // check_end_names is off: any end tag closes the
                    // innermost open element.
                    match stack.pop() {
                        Some(element) => match stack.last_mut() {
                            Some(parent) => parent.children.push(element),
                            None => return Ok(element),
                        },
                        None => unreachable!("expand starts with a non-empty stack"),
                    }
                }
                Event::Eof => {
                    // Truncated input: keep the well-formed portion.
                    log::warn!("input ended inside a record subtree; emitting partial record");
                    let mut element = match stack.pop() {
                        Some(element) => element,
                        None => unreachable!("expand starts with a non-empty stack"),
                    };
                    while let Some(mut parent) = stack.pop() {
                        parent.children.push(element);
                        element = parent;
                    }
                    return Ok(element);
                }
                _ => {}
            }
        }
    }

    /// Records a recoverable parser error, or promotes it to fatal
    /// when the reader made no progress since the previous error.
    fn note_recoverable(&mut self, source: quick_xml::Error) -> Result<(), MalformedInputError> {
        let position = self.reader.buffer_position() as u64;
        if self.last_error_pos == Some(position) {
            return Err(MalformedInputError { position, source });
        }
        self.last_error_pos = Some(position);
        self.skipped += 1;
        log::warn!("skipping malformed fragment at byte {position}: {source}");
        Ok(())
    }

}

fn element_from_start(start: &BytesStart, decoder: Decoder) -> Element {
    let mut element = Element::new(decode_lossy(start.name().local_name().as_ref(), decoder));
    // with_checks(false): under recovery a repeated attribute name is
    // not an error, last seen wins.
    for attr in start.attributes().with_checks(false).flatten() {
        let name = decode_lossy(attr.key.local_name().as_ref(), decoder);
        let value = attr
            .decode_and_unescape_value(decoder)
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
        element.set_attr(name, value);
    }
    element
}

fn decode_lossy(bytes: &[u8], decoder: Decoder) -> String {
    decoder
        .decode(bytes)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned())
}

fn name_matches(start: &BytesStart, tag: &str) -> bool {
    start.name().local_name().as_ref() == tag.as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(xml: &str) -> PullReader<Cursor<&str>> {
        PullReader::new(Cursor::new(xml))
    }

    #[test]
    fn test_materializes_each_record_in_document_order() {
        let xml = r#"<root><item id="1">Alpha</item><other/><item id="2">Beta</item></root>"#;
        let mut r = reader(xml);

        let first = r.next_record("item").unwrap().unwrap();
        assert_eq!(first.attr("id"), Some("1"));
        assert_eq!(first.trimmed_text(), "Alpha");

        let second = r.next_record("item").unwrap().unwrap();
        assert_eq!(second.attr("id"), Some("2"));

        assert!(r.next_record("item").unwrap().is_none());
    }

    #[test]
    fn test_subtree_with_nested_children_and_text() {
        let xml = "<doc><rec a=\"x\"><child><leaf>v1</leaf><leaf>v2</leaf></child>tail</rec></doc>";
        let mut r = reader(xml);
        let rec = r.next_record("rec").unwrap().unwrap();
        assert_eq!(rec.attr("a"), Some("x"));
        assert_eq!(rec.trimmed_text(), "tail");
        let child = rec.first_child("child").unwrap();
        let leaves: Vec<_> = child
            .children_named("leaf")
            .map(Element::trimmed_text)
            .collect();
        assert_eq!(leaves, ["v1", "v2"]);
    }

    #[test]
    fn test_empty_element_record() {
        let mut r = reader(r#"<root><item id="7"/></root>"#);
        let rec = r.next_record("item").unwrap().unwrap();
        assert_eq!(rec.attr("id"), Some("7"));
        assert!(rec.children.is_empty());
        assert_eq!(rec.trimmed_text(), "");
    }

    #[test]
    fn test_nested_record_tag_belongs_to_enclosing_record() {
        // A record tag inside a record is part of the subtree, not a
        // new record.
        let xml = "<root><item><item>inner</item></item><item>second</item></root>";
        let mut r = reader(xml);
        let first = r.next_record("item").unwrap().unwrap();
        assert_eq!(first.children.len(), 1);
        assert_eq!(first.children[0].trimmed_text(), "inner");
        let second = r.next_record("item").unwrap().unwrap();
        assert_eq!(second.trimmed_text(), "second");
        assert!(r.next_record("item").unwrap().is_none());
    }

    #[test]
    fn test_cdata_counts_as_direct_text() {
        let mut r = reader("<root><item><![CDATA[a < b]]></item></root>");
        let rec = r.next_record("item").unwrap().unwrap();
        assert_eq!(rec.trimmed_text(), "a < b");
    }

    #[test]
    fn test_entities_are_unescaped() {
        let mut r = reader(r#"<root><item note="a&amp;b">x &lt; y</item></root>"#);
        let rec = r.next_record("item").unwrap().unwrap();
        assert_eq!(rec.attr("note"), Some("a&b"));
        assert_eq!(rec.trimmed_text(), "x < y");
    }

    #[test]
    fn test_text_concatenates_around_children() {
        let mut r = reader("<root><item>before<child/>after</item></root>");
        let rec = r.next_record("item").unwrap().unwrap();
        assert_eq!(rec.text, "beforeafter");
    }

    #[test]
    fn test_mismatched_end_tags_recover() {
        // check_end_names is off: the stray end tag closes the inner
        // element and both records survive.
        let xml = "<root><item><a>1</b></item><item>ok</item></root>";
        let mut r = reader(xml);
        assert!(r.next_record("item").unwrap().is_some());
        let second = r.next_record("item").unwrap().unwrap();
        assert_eq!(second.trimmed_text(), "ok");
    }

    #[test]
    fn test_truncated_input_emits_partial_record() {
        let mut r = reader("<root><item id=\"1\"><name>Alpha</name>");
        let rec = r.next_record("item").unwrap().unwrap();
        assert_eq!(rec.attr("id"), Some("1"));
        assert_eq!(rec.first_child("name").unwrap().trimmed_text(), "Alpha");
        assert!(r.next_record("item").unwrap().is_none());
    }

    #[test]
    fn test_reader_stuck_at_one_byte_is_fatal() {
        use std::io::{BufReader, Read};

        // Yields a well-formed prefix, then fails every read, like a
        // torn-off pipe.
        struct DyingSource {
            prefix: Cursor<&'static str>,
        }
        impl Read for DyingSource {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                match self.prefix.read(buf)? {
                    0 => Err(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "device error",
                    )),
                    n => Ok(n),
                }
            }
        }

        let source = DyingSource {
            prefix: Cursor::new("<root><item>ok</item>"),
        };
        let mut r = PullReader::new(BufReader::new(source));

        let first = r.next_record("item").unwrap().unwrap();
        assert_eq!(first.trimmed_text(), "ok");

        // The first failure is skipped; the repeat at the same byte
        // position means no progress and must surface as fatal.
        let err = r.next_record("item").unwrap_err();
        assert_eq!(r.skipped(), 1);
        assert!(err.position > 0);
        assert!(err.to_string().contains("malformed XML input at byte"));
    }

    #[test]
    fn test_duplicate_attribute_last_seen_wins() {
        let mut r = reader(r#"<root><item id="1" id="2"/></root>"#);
        let rec = r.next_record("item").unwrap().unwrap();
        assert_eq!(rec.attr("id"), Some("2"));
        assert_eq!(rec.attributes.len(), 1);
    }
}
