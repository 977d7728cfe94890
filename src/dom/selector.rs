//! Selector matching for the headless document.
//!
//! Selectors are parsed by the `selectors` crate with scraper's parser
//! configuration, so [`MemoryDom`] accepts exactly what `scraper::Selector`
//! accepts: every combinator, attribute operator and tree-structural
//! pseudo-class (`:first-child`, `:nth-of-type(2n)`, `:not(…)`, `:has(…)`).
//! Pseudo-classes that depend on live UI state (`:hover`, `:focus`) are
//! rejected with [`DomError::InvalidSelector`].
//!
//! Matching walks the arena through [`NodeRef`], a borrowed
//! `(document, node)` pair implementing [`selectors::Element`] the same way
//! scraper's `ElementRef` does for its own tree.

use super::memory::MemoryDom;
use super::{DomError, NodeId};
use scraper::error::SelectorErrorKind;
use scraper::selector::{CssLocalName, CssString, NonTSPseudoClass, PseudoElement, Simple};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::bloom::BloomFilter;
use selectors::matching::{
    self, ElementSelectorFlags, MatchingContext, MatchingForInvalidation, MatchingMode,
    NeedsSelectorFlags, QuirksMode, SelectorCaches,
};
use selectors::parser::{ParseRelative, SelectorImpl};
use selectors::{Element, OpaqueElement, SelectorList};
use std::fmt;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// A parsed, comma-separated selector group.
#[derive(Debug, Clone)]
pub struct Selector(SelectorList<Simple>);

impl Selector {
    pub fn parse(input: &str) -> Result<Self, DomError> {
        let mut parser_input = cssparser::ParserInput::new(input);
        let mut parser = cssparser::Parser::new(&mut parser_input);
        SelectorList::parse(&scraper::selector::Parser, &mut parser, ParseRelative::No)
            .map(Self)
            .map_err(|err| DomError::InvalidSelector {
                selector: input.to_string(),
                reason: SelectorErrorKind::from(err).to_string(),
            })
    }

    pub fn matches(&self, dom: &MemoryDom, node: NodeId) -> bool {
        let element = NodeRef { dom, node };
        if !element.is_element() {
            return false;
        }
        let mut caches = SelectorCaches::default();
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            &mut caches,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            MatchingForInvalidation::No,
        );
        self.0
            .slice()
            .iter()
            .any(|s| matching::matches_selector(s, 0, None, &element, &mut context))
    }
}

/// An element of a [`MemoryDom`], as seen by the selector matcher.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    dom: &'a MemoryDom,
    node: NodeId,
}

impl NodeRef<'_> {
    /// The arena root is the document, not an element.
    fn is_element(&self) -> bool {
        !self.dom.tag(self.node).starts_with('#')
    }

    fn at(&self, node: NodeId) -> Self {
        Self {
            dom: self.dom,
            node,
        }
    }

    fn sibling(&self, offset: isize) -> Option<Self> {
        let parent = self.dom.parent_of(self.node)?;
        let siblings = self.dom.children(parent);
        let index = siblings.iter().position(|&n| n == self.node)?;
        let target = index.checked_add_signed(offset)?;
        siblings.get(target).map(|&n| self.at(n))
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> {:?}", self.dom.tag(self.node), self.node)
    }
}

impl Element for NodeRef<'_> {
    type Impl = Simple;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self.dom.attributes(self.node))
    }

    fn parent_element(&self) -> Option<Self> {
        self.dom
            .parent_of(self.node)
            .map(|parent| self.at(parent))
            .filter(NodeRef::is_element)
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.sibling(-1)
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.sibling(1)
    }

    fn first_element_child(&self) -> Option<Self> {
        self.dom.children(self.node).first().map(|&n| self.at(n))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, name: &CssLocalName) -> bool {
        self.dom.tag(self.node) == &*name.0
    }

    fn has_namespace(&self, ns: &<Simple as SelectorImpl>::BorrowedNamespaceUrl) -> bool {
        &**ns == HTML_NAMESPACE
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.dom.tag(self.node) == other.dom.tag(other.node)
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&<Simple as SelectorImpl>::NamespaceUrl>,
        local_name: &CssLocalName,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        // attributes are stored without a namespace
        let unqualified = match ns {
            NamespaceConstraint::Any => true,
            NamespaceConstraint::Specific(url) => url.is_empty(),
        };
        unqualified
            && self
                .dom
                .attr(self.node, &local_name.0)
                .is_some_and(|value| operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        _pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<'_, Simple>,
    ) -> bool {
        false
    }

    fn match_pseudo_element(
        &self,
        _pe: &PseudoElement,
        _context: &mut MatchingContext<'_, Simple>,
    ) -> bool {
        false
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        matches!(self.dom.tag(self.node), "a" | "area") && self.dom.attr(self.node, "href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        self.dom.tag(self.node) == "slot"
    }

    fn has_id(&self, id: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.dom
            .attr(self.node, "id")
            .is_some_and(|value| case_sensitivity.eq(id.0.as_bytes(), value.as_bytes()))
    }

    fn has_class(&self, name: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.dom.attr(self.node, "class").is_some_and(|list| {
            list.split_whitespace()
                .any(|class| case_sensitivity.eq(class.as_bytes(), name.0.as_bytes()))
        })
    }

    fn has_custom_state(&self, _name: &CssLocalName) -> bool {
        false
    }

    fn imported_part(&self, _name: &CssLocalName) -> Option<CssLocalName> {
        None
    }

    fn is_part(&self, _name: &CssLocalName) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.dom.children(self.node).is_empty() && self.dom.own_text(self.node).is_empty()
    }

    fn is_root(&self) -> bool {
        self.dom
            .parent_of(self.node)
            .is_some_and(|parent| !self.at(parent).is_element())
    }

    fn add_element_unique_hashes(&self, _filter: &mut BloomFilter) -> bool {
        false
    }
}
