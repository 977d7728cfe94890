//! Shared test utilities.
//!
//! [`fixture_page`] renders a small CV page with maud that carries every hook
//! the controllers look for: nav links, the typing line, hero blocks, skill
//! lists, project cards with thumbnails, the certificate carousel, the
//! contact form, a modal and a dropdown.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut dom = fixture_page();
//! lay_out_page(&mut dom);
//!
//! let cards = dom.query_all(".project-veiw-card").unwrap();
//! assert_eq!(active_count(&dom, &cards), 0);
//! ```

use maud::{DOCTYPE, Markup, html};

use crate::dom::{Dom, MemoryDom, NodeId, Rect};

/// Height given to every top-level section by [`lay_out_page`].
pub const SECTION_HEIGHT: f64 = 800.0;

/// Section ids in page order.
pub const SECTION_IDS: [&str; 4] = ["home", "SKILLS", "PROJECT", "contact"];

// =========================================================================
// Fixture page
// =========================================================================

pub fn fixture_markup() -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { "Jane Doe | CV" }
            }
            body.loading {
                nav.modern-nav {
                    a.nav-link href="#home" { "Home" }
                    a.nav-link href="#SKILLS" { "Skills" }
                    a.nav-link href="#PROJECT" { "Projects" }
                    a.nav-link href="#contact" { "Contact" }
                }
                div.page-progress {}
                div.animated-background {
                    span {}
                    span {}
                    span {}
                }
                section id="home" {
                    h1.hero-title { "Jane Doe" }
                    p.hero-subtitle { span.typing-effect {} }
                    p.hero-description { "Student and developer." }
                    div.hero-actions {
                        a.btn href="#PROJECT" { span { "See my work" } }
                    }
                    div.main-img { img src="./IMG_9346 (2).jpg" alt="portrait"; }
                }
                section id="SKILLS" {
                    ul.Tech-skills-list {
                        li { "Java" }
                        li { "Python" }
                        li { "SQL" }
                    }
                    ul.soft-skills-list {
                        li { "Teamwork" }
                        li { "Communication" }
                    }
                }
                section id="PROJECT" {
                    div.categroy {}
                    select id="PRO-LANG" {
                        option value="all" { "All" }
                        option value="java" { "Java" }
                        option value="python" { "Python" }
                    }
                    (project_card("java", "./java.png"))
                    (project_card("website javascript", "./site.png"))
                    (project_card("python", "./python.png"))
                    (project_card("mysql cyberSecurity", "./db.png"))
                    div.main-cert {
                        div.carousel-item { "Certificate A" }
                        div.carousel-item { "Certificate B" }
                        div.carousel-item { "Certificate C" }
                    }
                }
                section id="contact" {
                    div id="contact-info" { "jane@example.com" }
                    form id="contact-form" {
                        input name="name";
                        input name="email";
                        textarea name="message" {}
                        button type="submit" { "Send" }
                    }
                    img.lazy data-src="./map.png" alt="map";
                }
                div.reveal {}
                div.animated-element.animate-on-scroll {}
                div.modal.active { div.modal-backdrop {} }
                div.dropdown.open { button.dropdown-toggle { "More" } }
                button id="scroll-top" { "Top" }
            }
        }
    }
}

fn project_card(categories: &str, thumbnail: &str) -> Markup {
    html! {
        div class={ "project-veiw-card " (categories) } {
            div.project-veiw-img { img data-src=(thumbnail) alt=(categories); }
            h3 { (categories) }
        }
    }
}

/// The fixture page, parsed. Nothing has a box yet, so everything sits at
/// the top of the viewport.
pub fn fixture_page() -> MemoryDom {
    MemoryDom::parse_html(&fixture_markup().into_string())
}

/// Stack the sections top to bottom, [`SECTION_HEIGHT`] each. Every element
/// inside a section shares its box; elements outside any section are pushed
/// below the last one.
pub fn lay_out_page(dom: &mut MemoryDom) {
    let mut top = 0.0;
    for id in SECTION_IDS {
        let section = dom.element_by_id(id).unwrap();
        let rect = Rect {
            left: 0.0,
            top,
            width: 1280.0,
            height: SECTION_HEIGHT,
        };
        dom.set_layout(section, rect);
        for inner in dom.query_within(section, "*").unwrap() {
            dom.set_layout(inner, rect);
        }
        top += SECTION_HEIGHT;
    }
    let below = Rect {
        left: 0.0,
        top: top + 2000.0,
        width: 100.0,
        height: 100.0,
    };
    for selector in [".reveal", ".animated-element", ".modal", ".dropdown"] {
        for node in dom.query_all(selector).unwrap() {
            dom.set_layout(node, below);
        }
    }
}

// =========================================================================
// Assertions
// =========================================================================

/// How many of `nodes` carry the `active` class.
pub fn active_count(dom: &MemoryDom, nodes: &[NodeId]) -> usize {
    nodes.iter().filter(|&&n| dom.has_class(n, "active")).count()
}

/// Not hidden by an inline `display: none`.
pub fn is_displayed(dom: &MemoryDom, node: NodeId) -> bool {
    dom.style(node, "display").as_deref() != Some("none")
}

pub fn node(dom: &MemoryDom, selector: &str) -> NodeId {
    dom.query(selector)
        .unwrap()
        .unwrap_or_else(|| panic!("no element matches `{selector}`"))
}
