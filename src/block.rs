use serde::de::{self, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::error::{MailError, MailResult};

/// Version string written into new template documents
pub const TEMPLATE_VERSION: &str = "1.0";

pub const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";
pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";

/// A complete email template document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub version: String,
    pub root: Root,
}

/// Implicit root container: layout-level styling plus the ordered top-level blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Root {
    #[serde(default = "default_background_color")]
    pub background_color: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub children: Vec<Block>,
}

fn default_background_color() -> String {
    DEFAULT_BACKGROUND_COLOR.to_string()
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

impl Default for Template {
    fn default() -> Self {
        Template {
            version: TEMPLATE_VERSION.to_string(),
            root: Root::default(),
        }
    }
}

impl Default for Root {
    fn default() -> Self {
        Root {
            background_color: default_background_color(),
            font_family: default_font_family(),
            children: Vec::new(),
        }
    }
}

impl Template {
    /// Empty template with the default background and font
    pub fn new() -> Self {
        Self::default()
    }

    /// Template with the given top-level blocks
    pub fn with_children(children: Vec<Block>) -> Self {
        Template {
            root: Root {
                children,
                ..Root::default()
            },
            ..Template::default()
        }
    }

    pub fn children(&self) -> &[Block] {
        &self.root.children
    }

    /// Background color with the empty-string fallback applied
    pub fn background_color(&self) -> &str {
        non_empty(&self.root.background_color, DEFAULT_BACKGROUND_COLOR)
    }

    /// Font stack with the empty-string fallback applied
    pub fn font_family(&self) -> &str {
        non_empty(&self.root.font_family, DEFAULT_FONT_FAMILY)
    }
}

/// Block type discriminant, serialized with the interchange names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockType {
    Text,
    Image,
    Button,
    Columns,
    Divider,
    Spacer,
    Header,
    Footer,
    #[serde(alias = "social")]
    SocialLinks,
}

impl BlockType {
    pub const ALL: [BlockType; 9] = [
        BlockType::Text,
        BlockType::Image,
        BlockType::Button,
        BlockType::Columns,
        BlockType::Divider,
        BlockType::Spacer,
        BlockType::Header,
        BlockType::Footer,
        BlockType::SocialLinks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Text => "text",
            BlockType::Image => "image",
            BlockType::Button => "button",
            BlockType::Columns => "columns",
            BlockType::Divider => "divider",
            BlockType::Spacer => "spacer",
            BlockType::Header => "header",
            BlockType::Footer => "footer",
            BlockType::SocialLinks => "social-links",
        }
    }

    /// Types that render their own children (or structured sub-fields)
    /// instead of having them appended generically after their row
    pub fn owns_children(&self) -> bool {
        matches!(
            self,
            BlockType::Columns | BlockType::SocialLinks | BlockType::Footer | BlockType::Header
        )
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generate a fresh block id of the form `<prefix>-<uuid>`
pub fn generate_block_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// One node of the template tree
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: String,
    pub props: BlockProps,
    pub children: Option<Vec<Block>>,
}

impl Block {
    /// A new block of the given type with a fresh id, default props and no children
    pub fn new(block_type: BlockType) -> Self {
        Block {
            id: generate_block_id(block_type.as_str()),
            props: BlockProps::empty(block_type),
            children: None,
        }
    }

    pub fn with_id(id: impl Into<String>, props: BlockProps) -> Self {
        Block {
            id: id.into(),
            props,
            children: None,
        }
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn block_type(&self) -> BlockType {
        self.props.block_type()
    }

    /// Children slice; empty when the block has none
    pub fn children(&self) -> &[Block] {
        self.children.as_deref().unwrap_or(&[])
    }
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.children.is_some() { 4 } else { 3 };
        let mut state = serializer.serialize_struct("Block", len)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("type", &self.block_type())?;
        match &self.props {
            BlockProps::Text(p) => state.serialize_field("props", p)?,
            BlockProps::Image(p) => state.serialize_field("props", p)?,
            BlockProps::Button(p) => state.serialize_field("props", p)?,
            BlockProps::Columns(p) => state.serialize_field("props", p)?,
            BlockProps::Divider(p) => state.serialize_field("props", p)?,
            BlockProps::Spacer(p) => state.serialize_field("props", p)?,
            BlockProps::Header(p) => state.serialize_field("props", p)?,
            BlockProps::Footer(p) => state.serialize_field("props", p)?,
            BlockProps::SocialLinks(p) => state.serialize_field("props", p)?,
        }
        if let Some(children) = &self.children {
            state.serialize_field("children", children)?;
        }
        state.end()
    }
}

/// Wire shape of a block before its props are resolved against its type
#[derive(Deserialize)]
struct RawBlock {
    id: String,
    #[serde(rename = "type")]
    block_type: BlockType,
    #[serde(default)]
    props: Value,
    #[serde(default)]
    children: Option<Vec<Block>>,
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawBlock::deserialize(deserializer)?;
        let props = BlockProps::from_value(raw.block_type, raw.props).map_err(|e| {
            de::Error::custom(format!("block '{}' ({}): {}", raw.id, raw.block_type, e))
        })?;
        Ok(Block {
            id: raw.id,
            props,
            children: raw.children,
        })
    }
}

/// Typed props, one variant per block type
#[derive(Debug, Clone, PartialEq)]
pub enum BlockProps {
    Text(TextProps),
    Image(ImageProps),
    Button(ButtonProps),
    Columns(ColumnsProps),
    Divider(DividerProps),
    Spacer(SpacerProps),
    Header(HeaderProps),
    Footer(FooterProps),
    SocialLinks(SocialLinksProps),
}

impl BlockProps {
    /// Props with every field unset (all documented defaults apply)
    pub fn empty(block_type: BlockType) -> Self {
        match block_type {
            BlockType::Text => BlockProps::Text(TextProps::default()),
            BlockType::Image => BlockProps::Image(ImageProps::default()),
            BlockType::Button => BlockProps::Button(ButtonProps::default()),
            BlockType::Columns => BlockProps::Columns(ColumnsProps::default()),
            BlockType::Divider => BlockProps::Divider(DividerProps::default()),
            BlockType::Spacer => BlockProps::Spacer(SpacerProps::default()),
            BlockType::Header => BlockProps::Header(HeaderProps::default()),
            BlockType::Footer => BlockProps::Footer(FooterProps::default()),
            BlockType::SocialLinks => BlockProps::SocialLinks(SocialLinksProps::default()),
        }
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            BlockProps::Text(_) => BlockType::Text,
            BlockProps::Image(_) => BlockType::Image,
            BlockProps::Button(_) => BlockType::Button,
            BlockProps::Columns(_) => BlockType::Columns,
            BlockProps::Divider(_) => BlockType::Divider,
            BlockProps::Spacer(_) => BlockType::Spacer,
            BlockProps::Header(_) => BlockType::Header,
            BlockProps::Footer(_) => BlockType::Footer,
            BlockProps::SocialLinks(_) => BlockType::SocialLinks,
        }
    }

    /// Resolve an untyped props object against a block type. `null` means no props.
    ///
    /// Values that do not fit their field (an unknown alignment, a number where text is
    /// expected) are set aside in `extra` and the field keeps its default. Only a props
    /// value that is not an object at all is an error.
    pub fn from_value(block_type: BlockType, value: Value) -> Result<Self, serde_json::Error> {
        let object = match value {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => serde_json::from_value::<Map<String, Value>>(other)?,
        };
        let (props, set_aside) = Self::from_object(block_type, object);
        if !set_aside.is_empty() {
            tracing::warn!(%block_type, keys = ?set_aside, "props values ignored, defaults apply");
        }
        Ok(props)
    }

    fn from_object(block_type: BlockType, object: Map<String, Value>) -> (Self, Vec<String>) {
        match block_type {
            BlockType::Text => lenient_props(object, BlockProps::Text),
            BlockType::Image => lenient_props(object, BlockProps::Image),
            BlockType::Button => lenient_props(object, BlockProps::Button),
            BlockType::Columns => lenient_props(object, BlockProps::Columns),
            BlockType::Divider => lenient_props(object, BlockProps::Divider),
            BlockType::Spacer => lenient_props(object, BlockProps::Spacer),
            BlockType::Header => lenient_props(object, BlockProps::Header),
            BlockType::Footer => lenient_props(object, BlockProps::Footer),
            BlockType::SocialLinks => lenient_props(object, BlockProps::SocialLinks),
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            BlockProps::Text(p) => serde_json::to_value(p),
            BlockProps::Image(p) => serde_json::to_value(p),
            BlockProps::Button(p) => serde_json::to_value(p),
            BlockProps::Columns(p) => serde_json::to_value(p),
            BlockProps::Divider(p) => serde_json::to_value(p),
            BlockProps::Spacer(p) => serde_json::to_value(p),
            BlockProps::Header(p) => serde_json::to_value(p),
            BlockProps::Footer(p) => serde_json::to_value(p),
            BlockProps::SocialLinks(p) => serde_json::to_value(p),
        }
    }

    /// Shallow merge `{...self, ...patch}`. A `null` in the patch unsets the key.
    ///
    /// Unknown keys are kept. A patch value that does not fit its field is an error.
    pub fn merged(&self, patch: &Map<String, Value>) -> MailResult<BlockProps> {
        let block_type = self.block_type();
        let mut object = match self.to_value() {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(e) => {
                return Err(MailError::InvalidProps {
                    block_type: block_type.to_string(),
                    reason: e.to_string(),
                })
            }
        };
        for (key, value) in patch {
            if value.is_null() {
                object.remove(key);
            } else {
                object.insert(key.clone(), value.clone());
            }
        }

        let (props, set_aside) = Self::from_object(block_type, object);
        match set_aside.iter().find(|key| patch.contains_key(key.as_str())) {
            Some(key) => Err(MailError::InvalidProps {
                block_type: block_type.to_string(),
                reason: format!("value of '{}' does not fit", key),
            }),
            None => Ok(props),
        }
    }
}

/// Props structs keep what they do not model in a flattened `extra` map
trait PropsFields: DeserializeOwned + Default {
    fn extra_mut(&mut self) -> &mut Map<String, Value>;
}

macro_rules! impl_props_fields {
    ($($props:ty),* $(,)?) => {
        $(
            impl PropsFields for $props {
                fn extra_mut(&mut self) -> &mut Map<String, Value> {
                    &mut self.extra
                }
            }
        )*
    };
}

impl_props_fields!(
    TextProps,
    ImageProps,
    ButtonProps,
    ColumnsProps,
    DividerProps,
    SpacerProps,
    HeaderProps,
    FooterProps,
    SocialLinksProps,
);

/// Deserialize `object` key by key when it does not fit as a whole. Keys whose value is
/// rejected move to `extra`; their names are returned.
fn lenient_props<T: PropsFields>(
    object: Map<String, Value>,
    wrap: fn(T) -> BlockProps,
) -> (BlockProps, Vec<String>) {
    if let Ok(props) = serde_json::from_value::<T>(Value::Object(object.clone())) {
        return (wrap(props), Vec::new());
    }

    let mut fitting = Map::new();
    let mut rejected = Map::new();
    for (key, value) in object {
        let mut single = Map::new();
        single.insert(key.clone(), value.clone());
        if serde_json::from_value::<T>(Value::Object(single)).is_ok() {
            fitting.insert(key, value);
        } else {
            rejected.insert(key, value);
        }
    }

    let mut props: T = serde_json::from_value(Value::Object(fitting)).unwrap_or_default();
    let keys = rejected.keys().cloned().collect();
    props.extra_mut().extend(rejected);
    (wrap(props), keys)
}

/// Returns `value` unless it is empty, in which case `default`
pub(crate) fn non_empty<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

fn opt_str<'a>(value: &'a Option<String>, default: &'a str) -> &'a str {
    non_empty(value.as_deref().unwrap_or(""), default)
}

fn opt_len(value: &Option<Length>, default: &str) -> String {
    match value {
        Some(len) if !len.is_empty() => len.css(),
        _ => default.to_string(),
    }
}

/// A CSS length given either as a bare JSON number or a string such as `"16px"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Length {
    Number(f64),
    Text(String),
}

impl Length {
    /// CSS form: numbers are taken as pixels
    pub fn css(&self) -> String {
        match self {
            Length::Number(n) => format!("{}px", n),
            Length::Text(s) => s.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Length::Text(s) if s.is_empty())
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Number(n) => write!(f, "{}", n),
            Length::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Length {
    fn from(s: &str) -> Self {
        Length::Text(s.to_string())
    }
}

impl From<f64> for Length {
    fn from(n: f64) -> Self {
        Length::Number(n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
    Justify,
}

impl Align {
    pub fn as_str(&self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
            Align::Justify => "justify",
        }
    }
}

/// Text block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Marks `text` as markup produced by the rich-text editor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_rich_text: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<Length>,
    /// Keys this block type does not model, or whose values do not fit; written back as is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextProps {
    pub fn plain(text: impl Into<String>) -> Self {
        TextProps {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn rich(html: impl Into<String>) -> Self {
        TextProps {
            text: Some(html.into()),
            is_rich_text: Some(true),
            ..Default::default()
        }
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn is_rich_text(&self) -> bool {
        self.is_rich_text.unwrap_or(false)
    }

    pub fn align(&self) -> Align {
        self.align.unwrap_or(Align::Left)
    }

    pub fn color(&self) -> &str {
        opt_str(&self.color, "#000000")
    }

    pub fn font_size(&self) -> String {
        opt_len(&self.font_size, "16px")
    }

    pub fn line_height(&self) -> String {
        match &self.line_height {
            Some(len) if !len.is_empty() => len.to_string(),
            _ => "1.5".to_string(),
        }
    }

    pub fn padding(&self) -> String {
        opt_len(&self.padding, "10px")
    }
}

/// Image block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<Length>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImageProps {
    pub fn src(&self) -> &str {
        self.src.as_deref().unwrap_or("")
    }

    pub fn alt(&self) -> &str {
        opt_str(&self.alt, "Image")
    }

    pub fn align(&self) -> Align {
        self.align.unwrap_or(Align::Center)
    }

    pub fn padding(&self) -> String {
        opt_len(&self.padding, "10px")
    }
}

/// Button block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    /// `"full"` stretches the button table to 100%; anything else is `auto`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ButtonProps {
    pub fn text(&self) -> &str {
        opt_str(&self.text, "Click Me")
    }

    pub fn url(&self) -> &str {
        opt_str(&self.url, "#")
    }

    pub fn background_color(&self) -> &str {
        opt_str(&self.background_color, "#007bff")
    }

    pub fn color(&self) -> &str {
        opt_str(&self.color, "#ffffff")
    }

    pub fn border_radius(&self) -> String {
        opt_len(&self.border_radius, "4px")
    }

    pub fn padding(&self) -> String {
        opt_len(&self.padding, "12px 24px")
    }

    pub fn align(&self) -> Align {
        self.align.unwrap_or(Align::Center)
    }

    pub fn is_full_width(&self) -> bool {
        self.width.as_deref() == Some("full")
    }
}

pub const MIN_COLUMNS: usize = 2;
pub const MAX_COLUMNS: usize = 4;

/// Clamp a requested column count to `[MIN_COLUMNS, MAX_COLUMNS]`.
/// Missing, zero or non-finite counts fall back to the minimum.
pub fn clamp_column_count(count: Option<f64>) -> usize {
    match count {
        Some(n) if n.is_finite() && n >= 1.0 => {
            (n.trunc() as usize).clamp(MIN_COLUMNS, MAX_COLUMNS)
        }
        _ => MIN_COLUMNS,
    }
}

/// Columns container block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnsProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_count: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ColumnsProps {
    pub fn column_count(&self) -> usize {
        clamp_column_count(self.column_count)
    }

    pub fn gap(&self) -> String {
        opt_len(&self.gap, "10px")
    }

    pub fn padding(&self) -> String {
        opt_len(&self.padding, "10px")
    }

    pub fn background_color(&self) -> &str {
        opt_str(&self.background_color, "#ffffff")
    }
}

/// Divider block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividerProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<Length>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DividerProps {
    pub fn color(&self) -> &str {
        opt_str(&self.color, "#cccccc")
    }

    pub fn height(&self) -> String {
        opt_len(&self.height, "1px")
    }

    pub fn padding(&self) -> String {
        opt_len(&self.padding, "10px 0")
    }
}

/// Spacer block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpacerProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Length>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpacerProps {
    pub fn height(&self) -> String {
        opt_len(&self.height, "20px")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub url: String,
}

/// Header block: optional logo and navigation menu
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_width: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_height: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_menu: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_items: Option<Vec<MenuItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HeaderProps {
    pub fn logo_url(&self) -> &str {
        self.logo_url.as_deref().unwrap_or("")
    }

    pub fn logo_alt(&self) -> &str {
        opt_str(&self.logo_alt, "Logo")
    }

    pub fn logo_width(&self) -> String {
        opt_len(&self.logo_width, "150px")
    }

    pub fn logo_height(&self) -> String {
        opt_len(&self.logo_height, "auto")
    }

    pub fn menu_items(&self) -> &[MenuItem] {
        self.menu_items.as_deref().unwrap_or(&[])
    }

    /// Menu is rendered only when enabled and non-empty
    pub fn has_menu(&self) -> bool {
        self.show_menu.unwrap_or(false) && !self.menu_items().is_empty()
    }

    pub fn background_color(&self) -> &str {
        opt_str(&self.background_color, "#ffffff")
    }

    pub fn padding(&self) -> String {
        opt_len(&self.padding, "20px")
    }

    pub fn align(&self) -> Align {
        self.align.unwrap_or(Align::Left)
    }
}

/// Footer block: company info, legal links, copyright
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsubscribe_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy_policy_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_unsubscribe: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_privacy_policy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_terms: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FooterProps {
    pub fn company_name(&self) -> &str {
        self.company_name.as_deref().unwrap_or("")
    }

    pub fn company_address(&self) -> &str {
        self.company_address.as_deref().unwrap_or("")
    }

    pub fn copyright_text(&self) -> &str {
        self.copyright_text.as_deref().unwrap_or("")
    }

    pub fn unsubscribe_url(&self) -> &str {
        self.unsubscribe_url.as_deref().unwrap_or("")
    }

    pub fn privacy_policy_url(&self) -> &str {
        self.privacy_policy_url.as_deref().unwrap_or("")
    }

    pub fn terms_url(&self) -> &str {
        self.terms_url.as_deref().unwrap_or("")
    }

    pub fn background_color(&self) -> &str {
        opt_str(&self.background_color, "#f5f5f5")
    }

    pub fn text_color(&self) -> &str {
        opt_str(&self.text_color, "#666666")
    }

    pub fn font_size(&self) -> String {
        opt_len(&self.font_size, "12px")
    }

    pub fn padding(&self) -> String {
        opt_len(&self.padding, "20px")
    }

    // Links are shown unless explicitly switched off
    pub fn show_unsubscribe(&self) -> bool {
        self.show_unsubscribe != Some(false)
    }

    pub fn show_privacy_policy(&self) -> bool {
        self.show_privacy_policy != Some(false)
    }

    pub fn show_terms(&self) -> bool {
        self.show_terms != Some(false)
    }
}

/// Social network of a link. Names without a built-in icon are kept as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SocialPlatform {
    Facebook,
    X,
    Instagram,
    Linkedin,
    Youtube,
    Custom,
    Other(String),
}

impl SocialPlatform {
    pub fn as_str(&self) -> &str {
        match self {
            SocialPlatform::Facebook => "facebook",
            SocialPlatform::X => "x",
            SocialPlatform::Instagram => "instagram",
            SocialPlatform::Linkedin => "linkedin",
            SocialPlatform::Youtube => "youtube",
            SocialPlatform::Custom => "custom",
            SocialPlatform::Other(name) => name,
        }
    }
}

impl From<String> for SocialPlatform {
    fn from(name: String) -> Self {
        match name.as_str() {
            "facebook" => SocialPlatform::Facebook,
            "x" => SocialPlatform::X,
            "instagram" => SocialPlatform::Instagram,
            "linkedin" => SocialPlatform::Linkedin,
            "youtube" => SocialPlatform::Youtube,
            "custom" => SocialPlatform::Custom,
            _ => SocialPlatform::Other(name),
        }
    }
}

impl From<SocialPlatform> for String {
    fn from(platform: SocialPlatform) -> Self {
        platform.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLink {
    pub platform: SocialPlatform,
    #[serde(default)]
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// Social links block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinksProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<SocialLink>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_size: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spacing: Option<Length>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<Length>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SocialLinksProps {
    pub fn links(&self) -> &[SocialLink] {
        self.links.as_deref().unwrap_or(&[])
    }

    pub fn icon_size(&self) -> String {
        opt_len(&self.icon_size, "24px")
    }

    pub fn icon_color(&self) -> &str {
        opt_str(&self.icon_color, "#333333")
    }

    pub fn spacing(&self) -> String {
        opt_len(&self.spacing, "12px")
    }

    pub fn align(&self) -> Align {
        self.align.unwrap_or(Align::Center)
    }

    pub fn padding(&self) -> String {
        opt_len(&self.padding, "20px")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_block_wire_format() {
        let block = Block::with_id("t1", BlockProps::Text(TextProps::plain("Hi")));
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(
            value,
            json!({ "id": "t1", "type": "text", "props": { "text": "Hi" } })
        );
    }

    #[test]
    fn test_children_serialized_only_when_present() {
        let columns = Block::with_id("c1", BlockProps::empty(BlockType::Columns))
            .with_children(vec![Block::with_id("t1", BlockProps::empty(BlockType::Text))]);
        let value = serde_json::to_value(&columns).unwrap();
        assert_eq!(value["children"][0]["id"], "t1");
        assert!(value["children"][0].get("children").is_none());
    }

    #[test]
    fn test_missing_props_means_defaults() {
        let block: Block = serde_json::from_value(json!({ "id": "s", "type": "spacer" })).unwrap();
        assert_eq!(block.props, BlockProps::Spacer(SpacerProps::default()));
        if let BlockProps::Spacer(p) = &block.props {
            assert_eq!(p.height(), "20px");
        }
    }

    #[test]
    fn test_social_alias() {
        let block: Block =
            serde_json::from_value(json!({ "id": "s", "type": "social", "props": {} })).unwrap();
        assert_eq!(block.block_type(), BlockType::SocialLinks);
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "social-links");
    }

    #[test]
    fn test_misfit_values_fall_back_and_are_kept() {
        let value = json!({
            "id": "b",
            "type": "button",
            "props": { "text": 42, "align": "middle", "url": "https://example.com" }
        });
        let block: Block = serde_json::from_value(value.clone()).unwrap();
        let BlockProps::Button(props) = &block.props else {
            panic!("expected button props");
        };
        assert_eq!(props.text(), "Click Me");
        assert_eq!(props.align(), Align::Center);
        assert_eq!(props.url(), "https://example.com");
        assert_eq!(props.extra.get("align"), Some(&json!("middle")));

        assert_eq!(serde_json::to_value(&block).unwrap(), value);
    }

    #[test]
    fn test_unknown_keys_round_trip() {
        let value = json!({
            "id": "t",
            "type": "text",
            "props": { "text": "Hi", "fontWeight": "bold", "meta": { "source": "import" } }
        });
        let block: Block = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(serde_json::to_value(&block).unwrap(), value);
    }

    #[test]
    fn test_non_object_props_are_rejected() {
        let result: Result<Block, _> = serde_json::from_value(json!({
            "id": "b", "type": "button", "props": [1, 2]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_social_platform_is_kept() {
        let props: SocialLinksProps = serde_json::from_value(json!({
            "links": [{ "platform": "tiktok", "url": "https://tiktok.com/@acme" }]
        }))
        .unwrap();
        let link = &props.links()[0];
        assert_eq!(link.platform, SocialPlatform::Other("tiktok".into()));
        assert_eq!(link.url, "https://tiktok.com/@acme");
        assert_eq!(serde_json::to_value(link).unwrap()["platform"], "tiktok");
    }

    #[test]
    fn test_merge_keeps_unknown_keys() {
        let props = BlockProps::Text(TextProps::plain("Hi"));
        let patch = json!({ "fontWeight": "bold" });
        let merged = props.merged(patch.as_object().unwrap()).unwrap();
        let BlockProps::Text(text) = &merged else {
            panic!("expected text props");
        };
        assert_eq!(text.extra.get("fontWeight"), Some(&json!("bold")));
        assert_ne!(merged, props);
    }

    #[test]
    fn test_length_accepts_numbers_and_strings() {
        let props: TextProps =
            serde_json::from_value(json!({ "fontSize": 18, "lineHeight": 1.4, "padding": "4px 8px" }))
                .unwrap();
        assert_eq!(props.font_size(), "18px");
        assert_eq!(props.line_height(), "1.4");
        assert_eq!(props.padding(), "4px 8px");
    }

    #[test]
    fn test_empty_strings_fall_back_to_defaults() {
        let props = ButtonProps {
            text: Some(String::new()),
            color: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(props.text(), "Click Me");
        assert_eq!(props.color(), "#ffffff");
    }

    #[test]
    fn test_clamp_column_count() {
        assert_eq!(clamp_column_count(None), 2);
        assert_eq!(clamp_column_count(Some(0.0)), 2);
        assert_eq!(clamp_column_count(Some(1.0)), 2);
        assert_eq!(clamp_column_count(Some(3.0)), 3);
        assert_eq!(clamp_column_count(Some(3.7)), 3);
        assert_eq!(clamp_column_count(Some(12.0)), 4);
        assert_eq!(clamp_column_count(Some(f64::NAN)), 2);
    }

    #[test]
    fn test_merge_props_shallow() {
        let props = BlockProps::Text(TextProps {
            text: Some("old".into()),
            color: Some("#111111".into()),
            ..Default::default()
        });
        let patch = json!({ "text": "new", "align": "center" });
        let merged = props.merged(patch.as_object().unwrap()).unwrap();
        assert_eq!(
            merged,
            BlockProps::Text(TextProps {
                text: Some("new".into()),
                color: Some("#111111".into()),
                align: Some(Align::Center),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_merge_null_unsets() {
        let props = BlockProps::Spacer(SpacerProps {
            height: Some("40px".into()),
            ..Default::default()
        });
        let patch = json!({ "height": null });
        let merged = props.merged(patch.as_object().unwrap()).unwrap();
        assert_eq!(merged, BlockProps::Spacer(SpacerProps::default()));
    }

    #[test]
    fn test_merge_wrong_shape() {
        let props = BlockProps::Columns(ColumnsProps::default());
        let patch = json!({ "columnCount": "many" });
        let err = props.merged(patch.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, MailError::InvalidProps { .. }));
    }

    #[test]
    fn test_new_block_has_prefixed_unique_id() {
        let a = Block::new(BlockType::Image);
        let b = Block::new(BlockType::Image);
        assert!(a.id.starts_with("image-"));
        assert_ne!(a.id, b.id);
        assert!(a.children.is_none());
    }

    #[test]
    fn test_footer_links_default_on() {
        let props = FooterProps {
            show_terms: Some(false),
            ..Default::default()
        };
        assert!(props.show_unsubscribe());
        assert!(props.show_privacy_policy());
        assert!(!props.show_terms());
    }
}
