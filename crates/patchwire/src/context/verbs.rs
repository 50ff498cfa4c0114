//! Builders behind the Call/Submit/Send/Defer verbs.

use serde_json::{Value, json};

use super::Context;
use super::escape::{escape_html, script_safe};
use crate::action::Callable;
use crate::body::{BodyItem, Values};
use crate::deferred::DeferredJob;
use crate::target::{Swap, Target};

/// Client-side entry point an invocation compiles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// `__pw_call(event, ...)`, bound to a DOM event attribute.
    Call,
    /// `__pw_submit(event, ...)`, bound to a form's `onsubmit`.
    Submit,
    /// `__pw_send(...)`, callable from scripts without an event.
    Send,
}

impl Verb {
    /// Name of the client runtime function.
    #[must_use]
    pub fn function(&self) -> &'static str {
        match self {
            Self::Call => "__pw_call",
            Self::Submit => "__pw_submit",
            Self::Send => "__pw_send",
        }
    }
}

/// Chainable result of `call`, `submit` and `send`.
///
/// Terminal methods pick the swap mode and return the invocation. `Call` and
/// `Submit` output is escaped for a double-quoted HTML attribute; `Send`
/// output is plain JavaScript for use inside `<script>` elements.
#[derive(Debug, Clone)]
pub struct ActionBuilder {
    verb: Verb,
    path: String,
    items: Vec<BodyItem>,
}

impl ActionBuilder {
    pub(crate) fn new(verb: Verb, path: String, values: Values) -> Self {
        Self {
            verb,
            path,
            items: values.into_items(),
        }
    }

    /// Action path the invocation posts to.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Replaces the target's inner content.
    #[must_use]
    pub fn render(self, target: &Target) -> String {
        self.invocation(Swap::Inline, target.id())
    }

    /// Replaces the target element itself.
    #[must_use]
    pub fn replace(self, target: &Target) -> String {
        self.invocation(Swap::Outline, target.id())
    }

    /// Appends to the target's children.
    #[must_use]
    pub fn append(self, target: &Target) -> String {
        self.invocation(Swap::Append, target.id())
    }

    /// Prepends to the target's children.
    #[must_use]
    pub fn prepend(self, target: &Target) -> String {
        self.invocation(Swap::Prepend, target.id())
    }

    /// Uses the target's default swap mode.
    #[must_use]
    pub fn swap(self, target: &Target) -> String {
        self.invocation(target.swap(), target.id())
    }

    /// Runs the action for its side effects only.
    #[must_use]
    pub fn none(self) -> String {
        self.invocation(Swap::None, "")
    }

    fn invocation(&self, swap: Swap, id: &str) -> String {
        let arguments = format!(
            "{},{},{},{}",
            Value::from(swap.as_str()),
            Value::from(id),
            Value::from(self.path.as_str()),
            items_json(&self.items),
        );
        let function = self.verb.function();
        match self.verb {
            Verb::Call | Verb::Submit => escape_html(&format!("{function}(event,{arguments})")),
            Verb::Send => script_safe(&format!("{function}({arguments})")),
        }
    }
}

fn items_json(items: &[BodyItem]) -> Value {
    Value::Array(
        items
            .iter()
            .map(|item| json!({"name": item.name, "type": item.kind, "value": item.value}))
            .collect(),
    )
}

/// Placeholder shape rendered while a deferred job runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Skeleton {
    /// Heading and a couple of lines.
    #[default]
    Component,
    /// A column of rows.
    List,
    /// Heading, a large block and body text.
    Page,
    /// Labelled inputs.
    Form,
}

impl Skeleton {
    /// Renders the placeholder wrapped in an element carrying `id`.
    #[must_use]
    pub fn render(&self, id: &str) -> String {
        format!(
            "<div id=\"{}\" class=\"pw-skeleton\" aria-busy=\"true\">{}</div>",
            escape_html(id),
            self.shape()
        )
    }

    fn shape(&self) -> String {
        const TITLE: &str = r#"<div class="pw-skel pw-skel-title"></div>"#;
        const LINE: &str = r#"<div class="pw-skel pw-skel-line"></div>"#;
        const SHORT: &str = r#"<div class="pw-skel pw-skel-line pw-skel-short"></div>"#;
        const BLOCK: &str = r#"<div class="pw-skel pw-skel-block"></div>"#;
        const INPUT: &str = r#"<div class="pw-skel pw-skel-input"></div>"#;

        match self {
            Self::Component => [TITLE, LINE, SHORT].concat(),
            Self::List => LINE.repeat(5),
            Self::Page => [TITLE, BLOCK, LINE, LINE, SHORT].concat(),
            Self::Form => [SHORT, INPUT].concat().repeat(3),
        }
    }
}

/// Chainable result of `defer`.
///
/// `render` and `replace` queue the job and return the skeleton markup; the
/// job runs once the current response has been written.
#[derive(Debug)]
pub struct DeferBuilder<'ctx> {
    ctx: &'ctx mut Context,
    callable: Callable,
    items: Vec<BodyItem>,
    skeleton: Skeleton,
}

impl<'ctx> DeferBuilder<'ctx> {
    pub(crate) fn new(ctx: &'ctx mut Context, callable: Callable, values: Values) -> Self {
        Self {
            ctx,
            callable,
            items: values.into_items(),
            skeleton: Skeleton::default(),
        }
    }

    /// Chooses the placeholder shape.
    #[must_use]
    pub fn skeleton(mut self, skeleton: Skeleton) -> Self {
        self.skeleton = skeleton;
        self
    }

    /// Fills the target's inner content once the job finishes.
    pub fn render(self, target: &Target) -> String {
        self.queue(target, Swap::Inline)
    }

    /// Replaces the whole target element once the job finishes.
    pub fn replace(self, target: &Target) -> String {
        self.queue(target, Swap::Outline)
    }

    fn queue(self, target: &Target, swap: Swap) -> String {
        let job = DeferredJob::new(
            self.callable,
            target.id(),
            swap,
            self.items,
            self.ctx.session_id(),
        );
        self.ctx.push_job(job);
        self.skeleton.render(target.id())
    }
}
