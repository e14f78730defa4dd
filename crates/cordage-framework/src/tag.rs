//! Out-of-band metadata for modules and their handler methods.
//!
//! A [`TagStore`] maps a [`TagTarget`] (a module class, or one method of it)
//! to the options declared for it, one entry per [`TagKind`]. Tagging only
//! stores data: it never calls the handler it describes.
//!
//! ```rust,ignore
//! let class = TypeId::of::<Greeter>();
//! let mut tags = TagStore::new();
//! tags.tag(TagTarget::Class(class), Tag::Module(ModuleOptions::new("greeter")));
//! tags.tag(
//!     TagTarget::Method(class, "hello"),
//!     Tag::SlashCommand(SlashCommandOptions::new(CommandSpec::new("hello", "Say hi"))),
//! );
//!
//! assert!(tags.has_tag(TagTarget::Class(class), TagKind::Module));
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use crate::options::{
    AutoCompleteOptions, ComponentOptions, EventOptions, ModuleOptions, SlashCommandOptions,
    SubCommandOptions, TextCommandOptions,
};

/// What a tag is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagTarget {
    Class(TypeId),
    Method(TypeId, &'static str),
}

/// The closed set of tag kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Module,
    Event,
    SlashCommand,
    SubCommand,
    AutoComplete,
    Component,
    TextCommand,
}

impl TagKind {
    /// Kinds that may be attached to a handler method.
    pub const HANDLERS: [TagKind; 6] = [
        TagKind::Event,
        TagKind::SlashCommand,
        TagKind::SubCommand,
        TagKind::AutoComplete,
        TagKind::Component,
        TagKind::TextCommand,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Event => "event",
            Self::SlashCommand => "slash_command",
            Self::SubCommand => "sub_command",
            Self::AutoComplete => "auto_complete",
            Self::Component => "component",
            Self::TextCommand => "text_command",
        }
    }

    pub fn is_handler(self) -> bool {
        Self::HANDLERS.contains(&self)
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options stored under one tag kind.
#[derive(Debug, Clone)]
pub enum Tag {
    Module(ModuleOptions),
    Event(EventOptions),
    SlashCommand(SlashCommandOptions),
    SubCommand(SubCommandOptions),
    AutoComplete(AutoCompleteOptions),
    Component(ComponentOptions),
    TextCommand(TextCommandOptions),
}

impl Tag {
    pub fn kind(&self) -> TagKind {
        match self {
            Self::Module(_) => TagKind::Module,
            Self::Event(_) => TagKind::Event,
            Self::SlashCommand(_) => TagKind::SlashCommand,
            Self::SubCommand(_) => TagKind::SubCommand,
            Self::AutoComplete(_) => TagKind::AutoComplete,
            Self::Component(_) => TagKind::Component,
            Self::TextCommand(_) => TagKind::TextCommand,
        }
    }
}

/// Metadata map keyed by class and method identity.
#[derive(Debug, Clone, Default)]
pub struct TagStore {
    tags: HashMap<TagTarget, HashMap<TagKind, Tag>>,
}

impl TagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `tag` to `target`, replacing an earlier tag of the same kind.
    pub fn tag(&mut self, target: TagTarget, tag: Tag) -> Option<Tag> {
        self.tags.entry(target).or_default().insert(tag.kind(), tag)
    }

    /// Reads the tag of `kind` attached to `target`.
    pub fn read_tag(&self, target: TagTarget, kind: TagKind) -> Option<&Tag> {
        self.tags.get(&target).and_then(|tags| tags.get(&kind))
    }

    pub fn has_tag(&self, target: TagTarget, kind: TagKind) -> bool {
        self.read_tag(target, kind).is_some()
    }

    /// Removes the tag of `kind` from `target`.
    pub fn untag(&mut self, target: TagTarget, kind: TagKind) -> Option<Tag> {
        self.tags.get_mut(&target).and_then(|tags| tags.remove(&kind))
    }

    /// The handler kind currently attached to a method, if any.
    pub fn handler_kind(&self, target: TagTarget) -> Option<TagKind> {
        let tags = self.tags.get(&target)?;
        TagKind::HANDLERS
            .into_iter()
            .find(|kind| tags.contains_key(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cordage_core::CommandSpec;

    struct Greeter;

    #[test]
    fn test_class_and_method_tags_are_independent() {
        let class = TypeId::of::<Greeter>();
        let mut tags = TagStore::new();
        tags.tag(
            TagTarget::Class(class),
            Tag::Module(ModuleOptions::new("greeter")),
        );
        tags.tag(
            TagTarget::Method(class, "hello"),
            Tag::SlashCommand(SlashCommandOptions::new(CommandSpec::new("hello", "hi"))),
        );

        assert!(tags.has_tag(TagTarget::Class(class), TagKind::Module));
        assert!(!tags.has_tag(TagTarget::Class(class), TagKind::SlashCommand));
        assert!(!tags.has_tag(TagTarget::Method(class, "hello"), TagKind::Module));
        assert_eq!(
            tags.handler_kind(TagTarget::Method(class, "hello")),
            Some(TagKind::SlashCommand)
        );
    }

    #[test]
    fn test_retag_replaces_same_kind() {
        let target = TagTarget::Method(TypeId::of::<Greeter>(), "on_ready");
        let mut tags = TagStore::new();
        assert!(tags.tag(target, Tag::Event(EventOptions::new("ready"))).is_none());
        let previous = tags.tag(target, Tag::Event(EventOptions::new("ready").once()));

        assert!(matches!(previous, Some(Tag::Event(opts)) if !opts.once));
        match tags.read_tag(target, TagKind::Event) {
            Some(Tag::Event(opts)) => assert!(opts.once),
            other => panic!("unexpected tag: {other:?}"),
        }
    }

    #[test]
    fn test_read_missing_tag() {
        let tags = TagStore::new();
        let target = TagTarget::Class(TypeId::of::<Greeter>());
        assert!(tags.read_tag(target, TagKind::Module).is_none());
        assert_eq!(tags.handler_kind(target), None);
    }
}
