//! Materialized element subtree.

/// One XML element, materialized with its full subtree.
///
/// At most one record's subtree exists at a time: the pull reader
/// builds an `Element` for each matched record tag, the folder consumes
/// it, and it is dropped before the scan resumes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Local tag name.
    pub name: String,
    /// Attributes in document order. Names are unique: under lenient
    /// recovery a repeated attribute name overwrites the earlier value
    /// in place (last seen wins).
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<Element>,
    /// Concatenation of the element's direct text children, pre-trim.
    pub text: String,
}

impl Element {
    /// Creates an element with the given name and no content.
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Element::default()
        }
    }

    /// Adds or overwrites an attribute, keeping the original position
    /// when the name repeats.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Looks up an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// First child with the given tag name, if any.
    pub fn first_child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given tag name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Direct text content with surrounding whitespace removed.
    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }
}
