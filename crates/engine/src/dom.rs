//! In-memory document built from a static HTML snapshot
//!
//! The markup is parsed once with `scraper` (html5ever) and copied into an
//! arena so that form control state can be mutated by the interaction
//! simulator. Scripts in the snapshot are kept as inert text and never run;
//! behaviour reacting to notifications is attached from Rust through
//! [`Document::add_listener`].

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use scraper::{ElementRef, Html, Node as HtmlNode};
use serde::Serialize;
use tracing::{debug, warn};

use formgrade_common::{Error, Result};

/// Upper bound on notifications delivered by one flush
const MAX_FLUSH_EVENTS: usize = 10_000;

/// `type` values an `<input>` reports as-is; anything else reads as `text`
const INPUT_TYPES: &[&str] = &[
    "hidden", "text", "search", "tel", "url", "email", "password", "date", "month", "week",
    "time", "datetime-local", "number", "range", "color", "checkbox", "radio", "file",
    "submit", "image", "reset", "button",
];

/// Handle to a node in a [`Dom`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// An element with its markup attributes and live control state
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    value: String,
    checked: bool,
}

impl Element {
    /// Lowercase tag name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Markup attribute, as written in the snapshot
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(key, _)| key == name)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.attr("name").filter(|name| !name.is_empty())
    }

    fn is_control(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "select" | "textarea")
    }
}

/// A tag and attribute-equality query, the subset of selectors the grader
/// needs (`input[type="radio"][name="gender"]`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    tag: Option<String>,
    attrs: Vec<(String, String)>,
}

impl Query {
    /// Matches any element
    pub fn any() -> Self {
        Self::default()
    }

    /// Matches elements with the given tag
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_ascii_lowercase()),
            attrs: Vec::new(),
        }
    }

    /// Additionally require `name="value"`
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if element.tag != *tag {
                return false;
            }
        }
        self.attrs
            .iter()
            .all(|(name, value)| element.attr(name) == Some(value.as_str()))
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}", tag)?,
            None if self.attrs.is_empty() => write!(f, "*")?,
            None => {}
        }
        for (name, value) in &self.attrs {
            write!(f, "[{}=\"{}\"]", name, value)?;
        }
        Ok(())
    }
}

/// Notification kinds raised by the interaction simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Input,
    Change,
    Submit,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Input => write!(f, "input"),
            EventKind::Change => write!(f, "change"),
            EventKind::Submit => write!(f, "submit"),
        }
    }
}

/// A queued or delivered notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    seq: u64,
    kind: EventKind,
    target: NodeId,
    cancelable: bool,
    default_prevented: bool,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Cancel the default action; ignored for non-cancelable events
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }
}

/// Listener attached to the document
pub type Listener = Box<dyn FnMut(&mut Event, &mut Dom)>;

/// Arena-backed DOM tree.
///
/// Nodes are created in document order and never removed, so arena order
/// is document order.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
    id_index: HashMap<String, Vec<NodeId>>,
    pending: VecDeque<Event>,
    next_seq: u64,
}

impl Dom {
    fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            root: NodeId(0),
            id_index: HashMap::new(),
            pending: VecDeque::new(),
            next_seq: 0,
        }
    }

    fn from_html(html: &Html) -> Self {
        let mut dom = Self::new();
        let root = dom.root;
        dom.append_element(root, html.root_element());
        dom.initialize_controls();
        dom
    }

    // Iterative; children go on the stack reversed so arena order stays
    // document order.
    fn append_element(&mut self, parent: NodeId, source: ElementRef<'_>) {
        let mut stack = vec![(parent, *source)];
        while let Some((parent, node)) = stack.pop() {
            match node.value() {
                HtmlNode::Element(element) => {
                    let attrs = element
                        .attrs()
                        .map(|(name, value)| (name.to_string(), value.to_string()))
                        .collect();
                    let id =
                        self.create_element(parent, element.name().to_ascii_lowercase(), attrs);
                    stack.extend(node.children().rev().map(|child| (id, child)));
                }
                HtmlNode::Text(text) => {
                    self.create_node(parent, NodeKind::Text(text.to_string()));
                }
                _ => {}
            }
        }
    }

    fn create_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn create_element(
        &mut self,
        parent: NodeId,
        tag: String,
        attrs: Vec<(String, String)>,
    ) -> NodeId {
        let element = Element {
            tag,
            attrs,
            value: String::new(),
            checked: false,
        };
        let id_attr = element.id().map(str::to_string);
        let id = self.create_node(parent, NodeKind::Element(element));
        if let Some(id_attr) = id_attr {
            self.id_index.entry(id_attr).or_default().push(id);
        }
        id
    }

    // Control state starts from the markup defaults: the value attribute,
    // textarea text, the selected option, and the checked attribute.
    fn initialize_controls(&mut self) {
        let controls: Vec<NodeId> = self
            .element_ids()
            .filter(|id| self.element(*id).map_or(false, Element::is_control))
            .collect();

        for node in controls {
            let Some(element) = self.element(node) else {
                continue;
            };
            let tag = element.tag.clone();
            let checked = element.has_attr("checked");
            let value = match tag.as_str() {
                "textarea" => self.text_content(node),
                "select" => self.default_select_value(node),
                _ => self.default_input_value(node),
            };
            if let Some(element) = self.element_mut(node) {
                element.value = value;
                element.checked = checked;
            }
        }
    }

    fn default_input_value(&self, node: NodeId) -> String {
        let Some(element) = self.element(node) else {
            return String::new();
        };
        match element.attr("value") {
            Some(value) => value.to_string(),
            None if self.is_checkable(node) => "on".to_string(),
            None => String::new(),
        }
    }

    // The last option marked `selected` wins. Without one, a list box
    // (`multiple` or `size` > 1) has no value and a drop-down shows its
    // first enabled option.
    fn default_select_value(&self, select: NodeId) -> String {
        let options = self.options(select);
        if let Some(option) = options.iter().rev().find(|o| self.has_attr(**o, "selected")) {
            return self.option_value(*option);
        }

        let list_box = self.has_attr(select, "multiple")
            || self
                .attr(select, "size")
                .and_then(|size| size.trim().parse::<u32>().ok())
                .map_or(false, |size| size > 1);
        if list_box {
            return String::new();
        }

        options
            .iter()
            .find(|option| !self.option_disabled(**option))
            .map(|option| self.option_value(*option))
            .unwrap_or_default()
    }

    fn option_disabled(&self, option: NodeId) -> bool {
        self.has_attr(option, "disabled")
            || self
                .closest(option, "optgroup")
                .map_or(false, |group| self.has_attr(group, "disabled"))
    }

    fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants(select)
            .into_iter()
            .filter(|id| self.tag_name(*id) == Some("option"))
            .collect()
    }

    fn option_value(&self, option: NodeId) -> String {
        match self.attr(option, "value") {
            Some(value) => value.to_string(),
            None => self.text_content(option).trim().to_string(),
        }
    }

    /// Values of a select's options, in document order
    pub fn option_values(&self, select: NodeId) -> Vec<String> {
        self.options(select)
            .into_iter()
            .map(|option| self.option_value(option))
            .collect()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(node.0)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(Element::tag)
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|e| e.attr(name))
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.element(node).map_or(false, |e| e.has_attr(name))
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    /// First element with the given id, in document order
    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).and_then(|ids| ids.first().copied())
    }

    /// All element nodes in document order
    pub fn element_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node.kind, NodeKind::Element(_)))
            .map(|(index, _)| NodeId(index))
    }

    /// First element matching the query, in document order
    pub fn query(&self, query: &Query) -> Option<NodeId> {
        self.element_ids()
            .find(|id| self.element(*id).map_or(false, |e| query.matches(e)))
    }

    pub fn query_all(&self, query: &Query) -> Vec<NodeId> {
        self.element_ids()
            .filter(|id| self.element(*id).map_or(false, |e| query.matches(e)))
            .collect()
    }

    /// Descendants of `node` in document order, excluding `node`
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[node.0].children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        out
    }

    /// Nearest inclusive ancestor with the given tag
    pub fn closest(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if self.tag_name(current) == Some(tag) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    pub fn text_content(&self, node: NodeId) -> String {
        if let NodeKind::Text(text) = &self.nodes[node.0].kind {
            return text.clone();
        }
        self.descendants(node)
            .into_iter()
            .filter_map(|id| match &self.nodes[id.0].kind {
                NodeKind::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The `type` a host reports for a control: lowercase input type with
    /// `text` as fallback, `textarea`, `select-one`/`select-multiple`, and
    /// `submit` as the button default.
    pub fn control_type(&self, node: NodeId) -> Option<String> {
        let element = self.element(node)?;
        let declared = element.attr("type").map(str::to_ascii_lowercase);
        let kind = match element.tag.as_str() {
            "input" => match declared {
                Some(kind) if INPUT_TYPES.contains(&kind.as_str()) => kind,
                _ => "text".to_string(),
            },
            "textarea" => "textarea".to_string(),
            "select" if element.has_attr("multiple") => "select-multiple".to_string(),
            "select" => "select-one".to_string(),
            "button" => match declared.as_deref() {
                Some("reset") => "reset".to_string(),
                Some("button") => "button".to_string(),
                _ => "submit".to_string(),
            },
            _ => return None,
        };
        Some(kind)
    }

    /// Checkbox or radio input
    pub fn is_checkable(&self, node: NodeId) -> bool {
        self.tag_name(node) == Some("input")
            && matches!(
                self.control_type(node).as_deref(),
                Some("checkbox") | Some("radio")
            )
    }

    pub fn value(&self, node: NodeId) -> Option<&str> {
        self.element(node)
            .filter(|e| e.is_control())
            .map(|e| e.value.as_str())
    }

    pub fn checked(&self, node: NodeId) -> Option<bool> {
        self.element(node).filter(|e| e.is_control()).map(|e| e.checked)
    }

    /// Set a control's value. A select only accepts one of its option
    /// values and reads as empty otherwise.
    pub fn set_value(&mut self, node: NodeId, value: &str) -> Result<()> {
        let tag = self
            .tag_name(node)
            .ok_or_else(|| Error::NotAControl(format!("{:?}", node)))?
            .to_string();
        let value = match tag.as_str() {
            "input" | "textarea" => value.to_string(),
            "select" => {
                let known = self
                    .options(node)
                    .into_iter()
                    .any(|option| self.option_value(option) == value);
                if known {
                    value.to_string()
                } else {
                    String::new()
                }
            }
            other => return Err(Error::NotAControl(other.to_string())),
        };
        if let Some(element) = self.element_mut(node) {
            element.value = value;
        }
        Ok(())
    }

    /// Set a checkbox or radio. Checking a radio clears the rest of its
    /// group (same name, same form).
    pub fn set_checked(&mut self, node: NodeId, checked: bool) -> Result<()> {
        if !self.is_checkable(node) {
            let tag = self.tag_name(node).unwrap_or("node").to_string();
            return Err(Error::NotAControl(format!("{} is not checkable", tag)));
        }

        if checked && self.control_type(node).as_deref() == Some("radio") {
            for peer in self.radio_group(node) {
                if peer != node {
                    if let Some(element) = self.element_mut(peer) {
                        element.checked = false;
                    }
                }
            }
        }

        if let Some(element) = self.element_mut(node) {
            element.checked = checked;
        }
        Ok(())
    }

    fn radio_group(&self, radio: NodeId) -> Vec<NodeId> {
        let Some(name) = self.element(radio).and_then(Element::name) else {
            return vec![radio];
        };
        let form = self.closest(radio, "form");
        self.query_all(&Query::tag("input").attr("name", name))
            .into_iter()
            .filter(|peer| self.control_type(*peer).as_deref() == Some("radio"))
            .filter(|peer| self.closest(*peer, "form") == form)
            .collect()
    }

    /// `input`, `select` and `textarea` descendants of `form`
    pub fn form_controls(&self, form: NodeId) -> Vec<NodeId> {
        self.descendants(form)
            .into_iter()
            .filter(|id| self.element(*id).map_or(false, Element::is_control))
            .collect()
    }

    /// All `input`, `select` and `textarea` elements in the document
    pub fn controls(&self) -> Vec<NodeId> {
        self.element_ids()
            .filter(|id| self.element(*id).map_or(false, Element::is_control))
            .collect()
    }

    /// Queue a notification; it is delivered by the next [`Document::flush`]
    pub fn dispatch(&mut self, kind: EventKind, target: NodeId) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push_back(Event {
            seq,
            kind,
            target,
            cancelable: kind == EventKind::Submit,
            default_prevented: false,
        });
        seq
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Short human-readable description of a node, e.g. `input#email`
    pub fn describe(&self, node: NodeId) -> String {
        match self.element(node) {
            Some(element) => match (element.id(), element.name()) {
                (Some(id), _) => format!("{}#{}", element.tag, id),
                (None, Some(name)) => format!("{}[name=\"{}\"]", element.tag, name),
                (None, None) => element.tag.clone(),
            },
            None => format!("node {}", node.0),
        }
    }
}

/// A loaded document plus its listeners and delivered-notification log
pub struct Document {
    dom: Dom,
    listeners: Vec<(EventKind, Listener)>,
    delivered: Vec<Event>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.dom.nodes.len())
            .field("listeners", &self.listeners.len())
            .field("delivered", &self.delivered.len())
            .finish()
    }
}

impl Document {
    /// Parse an HTML string
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        if !parsed.errors.is_empty() {
            warn!("HTML parser recovered from {} error(s)", parsed.errors.len());
        }
        Self {
            dom: Dom::from_html(&parsed),
            listeners: Vec::new(),
            delivered: Vec::new(),
        }
    }

    /// Parse an HTML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.display().to_string(),
            source,
        })?;
        let document = Self::parse(&content);
        debug!(
            "Loaded document {} ({} nodes)",
            path.display(),
            document.dom.nodes.len()
        );
        Ok(document)
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub(crate) fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    /// Attach a listener for one notification kind
    pub fn add_listener<F>(&mut self, kind: EventKind, listener: F)
    where
        F: FnMut(&mut Event, &mut Dom) + 'static,
    {
        self.listeners.push((kind, Box::new(listener)));
    }

    /// Deliver every queued notification, including ones queued by
    /// listeners while flushing. Returns the number delivered.
    pub fn flush(&mut self) -> usize {
        let mut listeners = std::mem::take(&mut self.listeners);
        let mut delivered = 0;

        while let Some(mut event) = self.dom.pending.pop_front() {
            if delivered == MAX_FLUSH_EVENTS {
                warn!(
                    "Dropping {} notification(s) after {} deliveries in one flush",
                    self.dom.pending.len() + 1,
                    MAX_FLUSH_EVENTS
                );
                self.dom.pending.clear();
                break;
            }
            for (kind, listener) in listeners.iter_mut() {
                if *kind == event.kind {
                    listener(&mut event, &mut self.dom);
                }
            }
            debug!(
                "Delivered {} to {}",
                event.kind,
                self.dom.describe(event.target)
            );
            self.delivered.push(event);
            delivered += 1;
        }

        self.listeners = listeners;
        delivered
    }

    /// Queue one notification, flush, and return it as delivered
    pub fn dispatch_now(&mut self, kind: EventKind, target: NodeId) -> Option<Event> {
        let seq = self.dom.dispatch(kind, target);
        self.flush();
        self.delivered.iter().rev().find(|e| e.seq == seq).cloned()
    }

    /// Notifications delivered so far, oldest first
    pub fn events(&self) -> &[Event] {
        &self.delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const FORM: &str = r#"
        <!DOCTYPE html>
        <html><body>
        <form id="signup">
            <label for="email">Email <b>address</b></label>
            <input id="email" type="email" name="email" value="seed@example.com">
            <input id="terms" type="checkbox" checked>
            <input type="radio" name="plan" value="basic">
            <input type="radio" name="plan" value="pro" checked>
            <select id="country">
                <option value="">Choose</option>
                <option value="ca" selected>Canada</option>
                <option>Peru</option>
            </select>
            <textarea id="bio">Hello there</textarea>
            <input id="mystery" type="Fancy">
            <button id="go">Send</button>
        </form>
        <script>document.getElementById('email').value = 'x';</script>
        </body></html>
    "#;

    #[test]
    fn test_controls_start_from_markup_defaults() {
        let doc = Document::parse(FORM);
        let dom = doc.dom();

        let email = dom.by_id("email").unwrap();
        assert_eq!(dom.value(email), Some("seed@example.com"));

        let terms = dom.by_id("terms").unwrap();
        assert_eq!(dom.checked(terms), Some(true));
        assert_eq!(dom.value(terms), Some("on"));

        let country = dom.by_id("country").unwrap();
        assert_eq!(dom.value(country), Some("ca"));

        let bio = dom.by_id("bio").unwrap();
        assert_eq!(dom.value(bio), Some("Hello there"));
    }

    #[test]
    fn test_control_type_follows_host_rules() {
        let doc = Document::parse(FORM);
        let dom = doc.dom();
        let kind = |id: &str| dom.control_type(dom.by_id(id).unwrap());

        assert_eq!(kind("email").as_deref(), Some("email"));
        assert_eq!(kind("country").as_deref(), Some("select-one"));
        assert_eq!(kind("bio").as_deref(), Some("textarea"));
        assert_eq!(kind("go").as_deref(), Some("submit"));
        assert_eq!(kind("mystery").as_deref(), Some("text"));
        assert_eq!(dom.control_type(dom.by_id("signup").unwrap()), None);
    }

    #[test]
    fn test_query_matches_tag_and_attributes() {
        let doc = Document::parse(FORM);
        let dom = doc.dom();

        let query = Query::tag("input").attr("type", "radio").attr("name", "plan");
        assert_eq!(query.to_string(), "input[type=\"radio\"][name=\"plan\"]");
        let radios = dom.query_all(&query);
        assert_eq!(radios.len(), 2);
        assert_eq!(dom.query(&query), Some(radios[0]));
        assert_eq!(dom.query(&Query::any().attr("name", "nope")), None);
    }

    #[test]
    fn test_text_content_and_closest() {
        let doc = Document::parse(FORM);
        let dom = doc.dom();
        let label = dom.query(&Query::tag("label")).unwrap();
        assert_eq!(dom.text_content(label), "Email address");

        let email = dom.by_id("email").unwrap();
        assert_eq!(dom.closest(email, "form"), dom.by_id("signup"));
        assert_eq!(dom.closest(email, "label"), None);
    }

    #[test]
    fn test_scripts_are_inert() {
        let doc = Document::parse(FORM);
        let dom = doc.dom();
        assert_eq!(dom.value(dom.by_id("email").unwrap()), Some("seed@example.com"));
    }

    #[test]
    fn test_checking_a_radio_clears_its_group() {
        let mut doc = Document::parse(FORM);
        let radios = doc
            .dom()
            .query_all(&Query::tag("input").attr("name", "plan"));
        doc.dom_mut().set_checked(radios[0], true).unwrap();
        assert_eq!(doc.dom().checked(radios[0]), Some(true));
        assert_eq!(doc.dom().checked(radios[1]), Some(false));
    }

    #[test]
    fn test_select_rejects_unknown_values() {
        let mut doc = Document::parse(FORM);
        let country = doc.dom().by_id("country").unwrap();
        doc.dom_mut().set_value(country, "Peru").unwrap();
        assert_eq!(doc.dom().value(country), Some("Peru"));
        doc.dom_mut().set_value(country, "Atlantis").unwrap();
        assert_eq!(doc.dom().value(country), Some(""));
    }

    #[test]
    fn test_set_checked_rejects_text_inputs() {
        let mut doc = Document::parse(FORM);
        let email = doc.dom().by_id("email").unwrap();
        assert!(matches!(
            doc.dom_mut().set_checked(email, true),
            Err(Error::NotAControl(_))
        ));
    }

    #[test]
    fn test_flush_delivers_in_order_including_cascades() {
        let mut doc = Document::parse(FORM);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&seen);
        doc.add_listener(EventKind::Input, move |event, dom| {
            log.borrow_mut().push(format!("input:{}", dom.describe(event.target())));
            dom.dispatch(EventKind::Change, event.target());
        });
        let log = Rc::clone(&seen);
        doc.add_listener(EventKind::Change, move |event, dom| {
            log.borrow_mut().push(format!("change:{}", dom.describe(event.target())));
        });

        let email = doc.dom().by_id("email").unwrap();
        doc.dom_mut().dispatch(EventKind::Input, email);
        assert!(doc.dom().has_pending());
        assert_eq!(doc.flush(), 2);
        assert!(!doc.dom().has_pending());
        assert_eq!(
            *seen.borrow(),
            vec!["input:input#email".to_string(), "change:input#email".to_string()]
        );
        assert_eq!(doc.events().len(), 2);
    }

    #[test]
    fn test_only_submit_can_be_prevented() {
        let mut doc = Document::parse(FORM);
        doc.add_listener(EventKind::Submit, |event, _| event.prevent_default());
        doc.add_listener(EventKind::Change, |event, _| event.prevent_default());

        let form = doc.dom().by_id("signup").unwrap();
        let submit = doc.dispatch_now(EventKind::Submit, form).unwrap();
        assert!(submit.default_prevented());

        let email = doc.dom().by_id("email").unwrap();
        let change = doc.dispatch_now(EventKind::Change, email).unwrap();
        assert!(!change.default_prevented());
    }

    #[test]
    fn test_from_file_reports_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = Document::from_file(&dir.path().join("index.html")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }

    #[test]
    fn test_select_default_follows_host_rules() {
        let doc = Document::parse(
            r#"<form>
                <select id="multi" multiple><option>a</option><option>b</option></select>
                <select id="listbox" size="3"><option>a</option><option>b</option></select>
                <select id="skip"><option disabled>-</option><option>a</option></select>
                <select id="group">
                    <optgroup label="x" disabled><option>off</option></optgroup>
                    <option>on</option>
                </select>
                <select id="last"><option selected>a</option><option selected>b</option></select>
                <select id="picked" multiple><option>a</option><option selected>b</option></select>
                <select id="none"><option disabled>only</option></select>
            </form>"#,
        );
        let dom = doc.dom();
        let value = |id: &str| dom.value(dom.by_id(id).unwrap()).unwrap().to_string();

        assert_eq!(value("multi"), "");
        assert_eq!(value("listbox"), "");
        assert_eq!(value("skip"), "a");
        assert_eq!(value("group"), "on");
        assert_eq!(value("last"), "b");
        assert_eq!(value("picked"), "b");
        assert_eq!(value("none"), "");
    }

    #[test]
    fn test_deeply_nested_markup_loads() {
        let depth = 50_000;
        let markup = format!(
            "<form>{}<input id=\"x\" value=\"deep\">{}</form>",
            "<span>".repeat(depth),
            "</span>".repeat(depth)
        );
        let doc = Document::parse(&markup);
        let dom = doc.dom();

        let input = dom.by_id("x").unwrap();
        assert_eq!(dom.value(input), Some("deep"));
        let form = dom.query(&Query::tag("form")).unwrap();
        assert_eq!(dom.closest(input, "form"), Some(form));
        assert_eq!(dom.form_controls(form), vec![input]);
        assert_eq!(dom.text_content(form), "");
    }
}
