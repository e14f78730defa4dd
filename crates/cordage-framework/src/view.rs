//! Views: reusable component layouts with their callbacks.
//!
//! A [`View`] groups buttons and select menus under one set of
//! [`ViewOptions`]. Each component is registered by the leading key of its
//! custom id and routed like a module component, with the view's flags OR'd
//! into the component's own.
//!
//! ```rust,ignore
//! fn confirm_view() -> View {
//!     View::builder(ViewOptions::new("moderation").author_only(true))
//!         .component(Row::First, ViewComponent::button("confirm", "Confirm").style(ButtonStyle::Danger), |interaction, args| async move {
//!             ban(&interaction, &args).await
//!         })
//!         .component(Row::First, ViewComponent::button("cancel", "Cancel"), |_, _| async { Ok(()) })
//!         .build()
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use cordage_core::{ComponentKind, Interaction};
use futures::FutureExt;
use serde::Serialize;
use tracing::warn;

use crate::guard::FnService;
use crate::handler::{Executor, HandlerResult, Invocation, mismatch};
use crate::options::{ComponentOptions, ViewOptions};
use crate::registry::ViewEntry;

/// Buttons a single row holds at most.
pub const MAX_BUTTONS_PER_ROW: usize = 5;

/// Action row position, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Row {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
}

impl Row {
    pub const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    #[default]
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A component as rendered into an action row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewComponent {
    Button {
        custom_id: String,
        label: String,
        style: ButtonStyle,
    },
    StringSelect {
        custom_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
        options: Vec<SelectOption>,
    },
    UserSelect {
        custom_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    RoleSelect {
        custom_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
    ChannelSelect {
        custom_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },
}

impl ViewComponent {
    pub fn button(custom_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Button {
            custom_id: custom_id.into(),
            label: label.into(),
            style: ButtonStyle::default(),
        }
    }

    pub fn string_select(custom_id: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self::StringSelect {
            custom_id: custom_id.into(),
            placeholder: None,
            options,
        }
    }

    pub fn user_select(custom_id: impl Into<String>) -> Self {
        Self::UserSelect {
            custom_id: custom_id.into(),
            placeholder: None,
        }
    }

    pub fn role_select(custom_id: impl Into<String>) -> Self {
        Self::RoleSelect {
            custom_id: custom_id.into(),
            placeholder: None,
        }
    }

    pub fn channel_select(custom_id: impl Into<String>) -> Self {
        Self::ChannelSelect {
            custom_id: custom_id.into(),
            placeholder: None,
        }
    }

    /// Sets the button style. No effect on select menus.
    pub fn style(mut self, new_style: ButtonStyle) -> Self {
        if let Self::Button { style, .. } = &mut self {
            *style = new_style;
        }
        self
    }

    /// Sets the select menu placeholder. No effect on buttons.
    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        match &mut self {
            Self::Button { .. } => {}
            Self::StringSelect { placeholder, .. }
            | Self::UserSelect { placeholder, .. }
            | Self::RoleSelect { placeholder, .. }
            | Self::ChannelSelect { placeholder, .. } => *placeholder = Some(text.into()),
        }
        self
    }

    pub fn custom_id(&self) -> &str {
        match self {
            Self::Button { custom_id, .. }
            | Self::StringSelect { custom_id, .. }
            | Self::UserSelect { custom_id, .. }
            | Self::RoleSelect { custom_id, .. }
            | Self::ChannelSelect { custom_id, .. } => custom_id,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Button { .. } => ComponentKind::Button,
            Self::StringSelect { .. } => ComponentKind::StringSelect,
            Self::UserSelect { .. } => ComponentKind::UserSelect,
            Self::RoleSelect { .. } => ComponentKind::RoleSelect,
            Self::ChannelSelect { .. } => ComponentKind::ChannelSelect,
        }
    }

    pub fn is_select(&self) -> bool {
        !matches!(self, Self::Button { .. })
    }
}

/// One rendered action row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRow {
    pub components: Vec<ViewComponent>,
}

// ─── View ────────────────────────────────────────────────────────────────────

/// A component of a view together with its placement and callback.
#[derive(Clone)]
pub struct ViewItem {
    pub component: ViewComponent,
    pub row: Row,
    pub options: ComponentOptions,
    executor: Executor,
}

impl fmt::Debug for ViewItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewItem")
            .field("component", &self.component)
            .field("row", &self.row)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct View {
    options: ViewOptions,
    items: Vec<ViewItem>,
}

impl View {
    pub fn builder(options: ViewOptions) -> ViewBuilder {
        ViewBuilder {
            options,
            items: Vec::new(),
        }
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    pub fn items(&self) -> &[ViewItem] {
        &self.items
    }

    /// Lays the components out into action rows.
    ///
    /// Buttons share a row, up to [`MAX_BUTTONS_PER_ROW`]. A select menu needs
    /// a row to itself. Components that do not fit are dropped with a warning.
    /// Empty rows are omitted.
    pub fn rows(&self) -> Vec<ActionRow> {
        let mut rows: BTreeMap<Row, Vec<ViewComponent>> = BTreeMap::new();
        for item in &self.items {
            let slot = rows.entry(item.row).or_default();
            let fits = if item.component.is_select() {
                slot.is_empty()
            } else {
                slot.len() < MAX_BUTTONS_PER_ROW && !slot.iter().any(ViewComponent::is_select)
            };
            if fits {
                slot.push(item.component.clone());
            } else {
                warn!(
                    module = %self.options.module,
                    custom_id = item.component.custom_id(),
                    row = item.row.index(),
                    "Component does not fit its row, dropped"
                );
            }
        }
        rows.into_values()
            .filter(|components| !components.is_empty())
            .map(|components| ActionRow { components })
            .collect()
    }

    /// Registry entries for every component, keyed by custom id.
    pub(crate) fn into_entries(self) -> impl Iterator<Item = (String, ViewEntry)> {
        let view = self.options;
        self.items.into_iter().map(move |item| {
            let key = crate::key::component(item.component.custom_id()).to_string();
            let entry = ViewEntry {
                view: view.clone(),
                options: item.options,
                executor: item.executor,
            };
            (key, entry)
        })
    }
}

pub struct ViewBuilder {
    options: ViewOptions,
    items: Vec<ViewItem>,
}

impl ViewBuilder {
    /// Adds a component with default component options.
    pub fn component<F, Fut>(self, row: Row, component: ViewComponent, f: F) -> Self
    where
        F: Fn(Arc<Interaction>, Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.component_with(row, component, |options| options, f)
    }

    /// Adds a component whose options are adjusted by `configure`.
    pub fn component_with<C, F, Fut>(mut self, row: Row, component: ViewComponent, configure: C, f: F) -> Self
    where
        C: FnOnce(ComponentOptions) -> ComponentOptions,
        F: Fn(Arc<Interaction>, Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let options = configure(ComponentOptions::new(component.custom_id()));
        let executor = Executor::new(FnService::new(move |invocation: Invocation| match invocation {
            Invocation::Component { interaction, args } => f(interaction, args).boxed(),
            other => mismatch("view component", "component", &other),
        }));
        self.items.push(ViewItem {
            component,
            row,
            options,
            executor,
        });
        self
    }

    pub fn build(self) -> View {
        View {
            options: self.options,
            items: self.items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn noop(_: Arc<Interaction>, _: Vec<String>) -> HandlerResult {
        Ok(())
    }

    fn custom_ids(row: &ActionRow) -> Vec<&str> {
        row.components.iter().map(ViewComponent::custom_id).collect()
    }

    #[test]
    fn test_buttons_share_a_row_up_to_five() {
        let mut builder = View::builder(ViewOptions::new("pager"));
        for i in 0..6 {
            builder = builder.component(Row::First, ViewComponent::button(format!("b{i}"), "x"), noop);
        }
        let rows = builder.build().rows();

        assert_eq!(rows.len(), 1);
        assert_eq!(custom_ids(&rows[0]), ["b0", "b1", "b2", "b3", "b4"]);
    }

    #[test]
    fn test_select_takes_a_whole_row() {
        let view = View::builder(ViewOptions::new("roles"))
            .component(Row::Second, ViewComponent::role_select("pick"), noop)
            .component(Row::Second, ViewComponent::button("late", "x"), noop)
            .component(Row::First, ViewComponent::button("first", "x"), noop)
            .component(Row::First, ViewComponent::user_select("crowded"), noop)
            .build();
        let rows = view.rows();

        assert_eq!(rows.len(), 2);
        assert_eq!(custom_ids(&rows[0]), ["first"]);
        assert_eq!(custom_ids(&rows[1]), ["pick"]);
    }

    #[test]
    fn test_entries_keyed_by_leading_custom_id() {
        let view = View::builder(ViewOptions::new("shop").author_only(true))
            .component_with(
                Row::First,
                ViewComponent::button("buy_item", "Buy"),
                |options| options.dev_only(true),
                noop,
            )
            .build();
        let entries: Vec<_> = view.into_entries().collect();

        assert_eq!(entries.len(), 1);
        let (key, entry) = &entries[0];
        assert_eq!(key, "buy");
        assert_eq!(entry.module(), "shop");
        let effective = entry.effective();
        assert!(effective.author_only && effective.dev_only);
    }

    #[test]
    fn test_rendered_row_serializes() {
        let row = ActionRow {
            components: vec![ViewComponent::button("ok", "OK").style(ButtonStyle::Success)],
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["components"][0]["type"], "button");
        assert_eq!(json["components"][0]["style"], "success");
    }
}
