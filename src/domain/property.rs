use quick_xml::escape::escape;

/// Ordered `ifl:property` key/value pairs of a single BPMN element.
///
/// Insertion order is the order written to the iFlow XML. Setting an existing
/// key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet {
    entries: Vec<(String, String)>,
}

impl PropertySet {
    pub fn new() -> Self {
        PropertySet { entries: Vec::new() }
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut set = PropertySet::new();
        for (key, value) in pairs {
            set.set(*key, *value);
        }
        set
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies every pair of `other` on top of this set.
    pub fn extend(&mut self, other: &PropertySet) {
        for (k, v) in other.iter() {
            self.set(k, v);
        }
    }
}

/// A single cell of a property table row, e.g. `<cell id='Name'>Content-Type</cell>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    pub id: String,
    pub value: String,
}

/// Nested table stored inside a single property value (content modifier
/// headers and properties, timer schedules).
///
/// `encode` produces the `<row><cell id='..'>..</cell></row>` markup. The
/// XML writer escapes that markup once more when it becomes a `<value>`, so
/// the final iFlow carries `&lt;row&gt;...` as SAP expects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyTable {
    pub rows: Vec<Vec<TableCell>>,
}

impl PropertyTable {
    pub fn new() -> Self {
        PropertyTable { rows: Vec::new() }
    }

    pub fn push_row(&mut self, cells: &[(&str, &str)]) {
        self.rows.push(
            cells
                .iter()
                .map(|(id, value)| TableCell { id: id.to_string(), value: value.to_string() })
                .collect(),
        );
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn encode(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            out.push_str("<row>");
            for cell in row {
                out.push_str("<cell id='");
                out.push_str(&escape(cell.id.as_str()));
                out.push_str("'>");
                out.push_str(&escape(cell.value.as_str()));
                out.push_str("</cell>");
            }
            out.push_str("</row>");
        }
        out
    }
}
