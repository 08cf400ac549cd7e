//! Language-agnostic value types shared by every component: symbol
//! descriptor parsing, source ranges, the closed kind enumeration, and
//! occurrence roles.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// A position span within a document. Lines are 0-based, matching the
/// convention occurrence ranges use on disk.
///
/// The on-wire encoding allows a 3-component shorthand
/// `[start_line, start_char, end_char]` for single-line ranges; callers
/// that decode from that shorthand should set `end_line == start_line`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start_line: u32,
    pub start_char: u32,
    pub end_line: u32,
    pub end_char: u32,
}

impl Range {
    pub fn new(start_line: u32, start_char: u32, end_line: u32, end_char: u32) -> Self {
        Self {
            start_line,
            start_char,
            end_line,
            end_char,
        }
    }

    /// A single-line range, as produced by the on-wire 3-component shorthand.
    pub fn single_line(line: u32, start_char: u32, end_char: u32) -> Self {
        Self::new(line, start_char, line, end_char)
    }

    pub fn is_single_line(&self) -> bool {
        self.start_line == self.end_line
    }
}

bitflags! {
    /// Bit flags describing the role(s) an occurrence plays.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Role: u32 {
        const DEFINITION   = 0b0001;
        const IMPORT       = 0b0010;
        const WRITE_ACCESS = 0b0100;
        const READ_ACCESS  = 0b1000;
    }
}

impl Role {
    /// Human-readable label used by `refs` output. Roles can combine;
    /// definition wins, then write, then read, then import, matching the
    /// priority an agent cares most about when skimming a reference list.
    pub fn label(&self) -> &'static str {
        if self.contains(Role::DEFINITION) {
            "definition"
        } else if self.contains(Role::WRITE_ACCESS) {
            "write"
        } else if self.contains(Role::READ_ACCESS) {
            "read"
        } else if self.contains(Role::IMPORT) {
            "import"
        } else {
            "reference"
        }
    }
}

/// Closed, language-agnostic enumeration of symbol kinds. Stable integer
/// codes so the on-disk encoding survives additions to this list as long
/// as existing variants keep their code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SymbolKind {
    Unspecified = 0,
    Array = 1,
    Boolean = 2,
    Class = 3,
    Constant = 4,
    Constructor = 5,
    Enum = 6,
    EnumMember = 7,
    Event = 8,
    Field = 9,
    File = 10,
    Function = 11,
    Interface = 12,
    Key = 13,
    Macro = 14,
    Method = 15,
    Module = 16,
    Namespace = 17,
    Null = 18,
    Number = 19,
    Object = 20,
    Operator = 21,
    Package = 22,
    Parameter = 23,
    Property = 24,
    String = 25,
    Struct = 26,
    Trait = 27,
    TraitMethod = 28,
    TypeAlias = 29,
    TypeParameter = 30,
    Union = 31,
    Variable = 32,
    Annotation = 33,
    Attribute = 34,
    Accessor = 35,
    Association = 36,
    BitFieldUnit = 37,
    Channel = 38,
    ClassMethod = 39,
    Define = 40,
    Delegate = 41,
    Delete = 42,
    Descriptor = 43,
    Destructor = 44,
    Directory = 45,
    Driver = 46,
    Extension = 47,
    Facet = 48,
    Get = 49,
    Global = 50,
    Grammar = 51,
    Indexer = 52,
    Label = 53,
    Lemma = 54,
    Library = 55,
    Local = 56,
    Mixin = 57,
    Modifier = 58,
    Pattern = 59,
    Predicate = 60,
    Protocol = 61,
    Quasiquoter = 62,
    Repository = 63,
    Rule = 64,
    Schema = 65,
    Section = 66,
    SelfParameter = 67,
    Set = 68,
    Setter = 69,
    Signature = 70,
    Singleton = 71,
    StaticEvent = 72,
    StaticField = 73,
    StaticMethod = 74,
    StaticProperty = 75,
    StaticVariable = 76,
    Subscript = 77,
    Tactic = 78,
    Task = 79,
    TermDefinition = 80,
    TestCase = 81,
    Theorem = 82,
    Type = 83,
    TypeClass = 84,
    TypeClassMethod = 85,
    Unit = 86,
    Value = 87,
    Watcher = 88,
}

impl SymbolKind {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Self::code`], used when decoding the on-disk index.
    pub fn from_code(code: u8) -> Option<Self> {
        use SymbolKind::*;
        const VARIANTS: &[SymbolKind] = &[
            Unspecified, Array, Boolean, Class, Constant, Constructor, Enum, EnumMember, Event,
            Field, File, Function, Interface, Key, Macro, Method, Module, Namespace, Null, Number,
            Object, Operator, Package, Parameter, Property, String, Struct, Trait, TraitMethod,
            TypeAlias, TypeParameter, Union, Variable, Annotation, Attribute, Accessor,
            Association, BitFieldUnit, Channel, ClassMethod, Define, Delegate, Delete, Descriptor,
            Destructor, Directory, Driver, Extension, Facet, Get, Global, Grammar, Indexer, Label,
            Lemma, Library, Local, Mixin, Modifier, Pattern, Predicate, Protocol, Quasiquoter,
            Repository, Rule, Schema, Section, SelfParameter, Set, Setter, Signature, Singleton,
            StaticEvent, StaticField, StaticMethod, StaticProperty, StaticVariable, Subscript,
            Tactic, Task, TermDefinition, TestCase, Theorem, Type, TypeClass, TypeClassMethod,
            Unit, Value, Watcher,
        ];
        VARIANTS.get(code as usize).copied()
    }

    /// Case-insensitive lookup by the kind's Rust identifier (e.g. "function",
    /// "Function" and "FUNCTION" all resolve). Used by the `kind` filter on
    /// `find`/`refs`/`symbols`.
    pub fn from_name(name: &str) -> Option<Self> {
        use SymbolKind::*;
        let lower = name.to_ascii_lowercase();
        Some(match lower.as_str() {
            "unspecified" => Unspecified,
            "array" => Array,
            "boolean" => Boolean,
            "class" => Class,
            "constant" => Constant,
            "constructor" => Constructor,
            "enum" => Enum,
            "enummember" | "enum_member" => EnumMember,
            "event" => Event,
            "field" => Field,
            "file" => File,
            "function" => Function,
            "interface" => Interface,
            "key" => Key,
            "macro" => Macro,
            "method" => Method,
            "module" => Module,
            "namespace" => Namespace,
            "null" => Null,
            "number" => Number,
            "object" => Object,
            "operator" => Operator,
            "package" => Package,
            "parameter" => Parameter,
            "property" => Property,
            "string" => String,
            "struct" => Struct,
            "trait" => Trait,
            "traitmethod" | "trait_method" => TraitMethod,
            "typealias" | "type_alias" => TypeAlias,
            "typeparameter" | "type_parameter" => TypeParameter,
            "union" => Union,
            "variable" => Variable,
            "annotation" => Annotation,
            "attribute" => Attribute,
            "accessor" => Accessor,
            "association" => Association,
            "bitfieldunit" | "bit_field_unit" => BitFieldUnit,
            "channel" => Channel,
            "classmethod" | "class_method" => ClassMethod,
            "define" => Define,
            "delegate" => Delegate,
            "delete" => Delete,
            "descriptor" => Descriptor,
            "destructor" => Destructor,
            "directory" => Directory,
            "driver" => Driver,
            "extension" => Extension,
            "facet" => Facet,
            "get" => Get,
            "global" => Global,
            "grammar" => Grammar,
            "indexer" => Indexer,
            "label" => Label,
            "lemma" => Lemma,
            "library" => Library,
            "local" => Local,
            "mixin" => Mixin,
            "modifier" => Modifier,
            "pattern" => Pattern,
            "predicate" => Predicate,
            "protocol" => Protocol,
            "quasiquoter" => Quasiquoter,
            "repository" => Repository,
            "rule" => Rule,
            "schema" => Schema,
            "section" => Section,
            "selfparameter" | "self_parameter" => SelfParameter,
            "set" => Set,
            "setter" => Setter,
            "signature" => Signature,
            "singleton" => Singleton,
            "staticevent" | "static_event" => StaticEvent,
            "staticfield" | "static_field" => StaticField,
            "staticmethod" | "static_method" => StaticMethod,
            "staticproperty" | "static_property" => StaticProperty,
            "staticvariable" | "static_variable" => StaticVariable,
            "subscript" => Subscript,
            "tactic" => Tactic,
            "task" => Task,
            "termdefinition" | "term_definition" => TermDefinition,
            "testcase" | "test_case" => TestCase,
            "theorem" => Theorem,
            "type" => Type,
            "typeclass" | "type_class" => TypeClass,
            "typeclassmethod" | "type_class_method" => TypeClassMethod,
            "unit" => Unit,
            "value" => Value,
            "watcher" => Watcher,
            _ => return None,
        })
    }

    /// The fixed set of kinds eligible for a file's explore table-of-contents
    /// (spec §4.5 step 6).
    pub fn is_toc_kind(self) -> bool {
        use SymbolKind::*;
        matches!(
            self,
            Class
                | Constant
                | Constructor
                | Enum
                | EnumMember
                | Function
                | Interface
                | Macro
                | Method
                | Module
                | Struct
                | Trait
                | Type
                | TypeAlias
                | Union
        )
    }
}

/// Extract the short display name from a symbol descriptor by scanning
/// backward from the descriptor's trailing suffix character.
///
/// Descriptor suffixes partition the string into segments:
/// `scheme manager#name.` — each segment ends in one of
/// `{ '/', '#', '.', ':', '!' }`. The short name is the final segment,
/// minus its suffix. Method-form segments `name(...).` are special-cased:
/// the parameter list is stripped so `foo(int, int).` yields `foo`.
pub fn extract_short_name(symbol: &str) -> &str {
    let trimmed = symbol.trim_end_matches(['/', '#', '.', ':', '!']);
    if trimmed.is_empty() {
        return symbol;
    }

    // Find the start of the final segment: the previous suffix
    // character, or the start of the string.
    let seg_start = trimmed
        .rfind(['/', '#', '.', ':', '!'])
        .map(|i| i + 1)
        .unwrap_or(0);
    let segment = &trimmed[seg_start..];

    // Method form: `name(params)` — strip the parameter list.
    if let Some(paren) = segment.find('(') {
        &segment[..paren]
    } else {
        segment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_single_line_shorthand() {
        let r = Range::single_line(4, 2, 10);
        assert!(r.is_single_line());
        assert_eq!(r.start_line, 4);
        assert_eq!(r.end_line, 4);
    }

    #[test]
    fn role_label_prefers_definition() {
        let role = Role::DEFINITION | Role::WRITE_ACCESS;
        assert_eq!(role.label(), "definition");
        assert_eq!(Role::READ_ACCESS.label(), "read");
        assert_eq!(Role::IMPORT.label(), "import");
    }

    #[test]
    fn kind_from_name_case_insensitive() {
        assert_eq!(SymbolKind::from_name("Function"), Some(SymbolKind::Function));
        assert_eq!(SymbolKind::from_name("STRUCT"), Some(SymbolKind::Struct));
        assert_eq!(SymbolKind::from_name("not_a_kind"), None);
    }

    #[test]
    fn kind_from_name_covers_the_type_alias_and_type_kinds() {
        assert_eq!(SymbolKind::from_name("type"), Some(SymbolKind::Type));
        assert_eq!(SymbolKind::from_name("type_alias"), Some(SymbolKind::TypeAlias));
        assert_eq!(SymbolKind::from_name("union"), Some(SymbolKind::Union));
    }

    #[test]
    fn kind_from_name_covers_every_variant() {
        for code in 0..=SymbolKind::Watcher.code() {
            let kind = SymbolKind::from_code(code).expect("every code up to Watcher is assigned");
            let name = format!("{kind:?}");
            let mut snake = String::new();
            for (i, ch) in name.char_indices() {
                if i > 0 && ch.is_ascii_uppercase() {
                    snake.push('_');
                }
                snake.push(ch.to_ascii_lowercase());
            }
            assert_eq!(SymbolKind::from_name(&snake), Some(kind), "missing from_name mapping for {name}");
        }
    }

    #[test]
    fn short_name_namespace_segment() {
        assert_eq!(extract_short_name("rust-pkg 0.1.0 settings/Settings#"), "Settings");
    }

    #[test]
    fn code_round_trips_through_from_code() {
        assert_eq!(SymbolKind::from_code(SymbolKind::Watcher.code()), Some(SymbolKind::Watcher));
        assert_eq!(SymbolKind::from_code(SymbolKind::Function.code()), Some(SymbolKind::Function));
        assert_eq!(SymbolKind::from_code(200), None);
    }

    #[test]
    fn short_name_method_form() {
        assert_eq!(
            extract_short_name("rust-pkg 0.1.0 commands/init(args)."),
            "init"
        );
    }
}
