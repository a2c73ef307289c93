//! RPC 类型路径与实例路径。
//!
//! # 模型（What）
//! - [`SchemaPath`]：RPC 在 Schema 中的定义位置，即 RPC 的“类型”；
//! - [`InstancePath`]：指向数据树中某个具体实例的路径，用作 RPC 的上下文引用，
//!   空路径即“全局”上下文；
//! - 两者都以 `Arc<[_]>` 承载，克隆只增加引用计数，标识符在两代契约之间转换时不会深拷贝路径。
//!
//! # 文本形式
//! - `SchemaPath`：`/mod:a/mod:b`（绝对）或 `mod:a/mod:b`（相对），根路径写作 `/`；
//! - `InstancePath`：`/nodes/node[id=n1]`，谓词按键名排序，空路径写作 `/`；
//!   谓词值中的 `\`、`[`、`]` 以反斜杠转义，例如 `[id=a\]b]` 表示值 `a]b`。

use std::{
    fmt::{self, Write as _},
    str::FromStr,
    sync::{Arc, LazyLock},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

static EMPTY_INSTANCE_PATH: LazyLock<InstancePath> = LazyLock::new(|| InstancePath {
    args: Arc::from(Vec::<PathArgument>::new()),
});

/// 路径解析失败。
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PathParseError {
    /// 输入为空字符串。
    #[error("path is empty")]
    Empty,
    /// 实例路径必须以 `/` 开头。
    #[error("instance path `{0}` is not absolute")]
    NotAbsolute(String),
    /// 出现了 `//` 之类的空段。
    #[error("path `{0}` contains an empty segment")]
    EmptySegment(String),
    /// 限定名包含保留字符或为空。
    #[error("invalid qualified name `{0}`")]
    InvalidName(String),
    /// 键谓词格式错误，例如缺少 `=` 或 `]`。
    #[error("malformed key predicate in `{0}`")]
    MalformedPredicate(String),
}

/// 限定名，形如 `module:local-name` 或 `local-name`。
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName(Arc<str>);

impl QName {
    /// 校验并构造限定名。
    ///
    /// 名称不得为空，且不得包含 `/`、`[`、`]`、`=` 或空白字符。
    pub fn new(value: impl Into<Arc<str>>) -> Result<Self, PathParseError> {
        let value = value.into();
        let reserved = |c: char| matches!(c, '/' | '[' | ']' | '=') || c.is_whitespace();
        if value.is_empty() || value.contains(reserved) {
            return Err(PathParseError::InvalidName(value.to_string()));
        }
        Ok(Self(value))
    }

    /// 返回原始字符串。
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 冒号前的模块前缀，不存在时返回 `None`。
    pub fn module(&self) -> Option<&str> {
        self.0.split_once(':').map(|(module, _)| module)
    }

    /// 冒号后的本地名；没有前缀时即整个名称。
    pub fn local_name(&self) -> &str {
        self.0.split_once(':').map_or(&*self.0, |(_, local)| local)
    }
}

impl fmt::Debug for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for QName {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// RPC 的类型：其定义在 Schema 中的路径。
///
/// # 契约说明（What）
/// - 不可变值类型，`Eq`/`Hash` 由“是否绝对”与组件序列共同决定；
/// - 组件序列以 `Arc<[QName]>` 共享，克隆为 O(1)。
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaPath {
    absolute: bool,
    components: Arc<[QName]>,
}

impl SchemaPath {
    /// 由组件序列构造路径。
    ///
    /// 没有组件的路径一律视为绝对根路径，相对的空路径没有文本形式。
    pub fn create(absolute: bool, components: impl IntoIterator<Item = QName>) -> Self {
        let components: Arc<[QName]> = components.into_iter().collect();
        Self {
            absolute: absolute || components.is_empty(),
            components,
        }
    }

    /// 绝对根路径。
    pub fn root() -> Self {
        Self::create(true, [])
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn components(&self) -> &[QName] {
        &self.components
    }

    /// 路径的最后一段，通常就是 RPC 名称。
    pub fn last_component(&self) -> Option<&QName> {
        self.components.last()
    }

    /// 追加一段，返回新路径。
    pub fn child(&self, name: QName) -> Self {
        let mut components = self.components.to_vec();
        components.push(name);
        Self {
            absolute: self.absolute,
            components: components.into(),
        }
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() && self.absolute {
            return f.write_str("/");
        }
        for (index, component) in self.components.iter().enumerate() {
            if self.absolute || index > 0 {
                f.write_str("/")?;
            }
            f.write_str(component.as_str())?;
        }
        Ok(())
    }
}

impl fmt::Debug for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaPath({self})")
    }
}

impl FromStr for SchemaPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PathParseError::Empty);
        }
        let (absolute, body) = match trimmed.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        if body.is_empty() {
            return Ok(Self::root());
        }
        let components = body
            .split('/')
            .map(|segment| {
                if segment.is_empty() {
                    Err(PathParseError::EmptySegment(trimmed.to_owned()))
                } else {
                    QName::new(segment)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::create(absolute, components))
    }
}

impl TryFrom<String> for SchemaPath {
    type Error = PathParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SchemaPath> for String {
    fn from(value: SchemaPath) -> Self {
        value.to_string()
    }
}

/// 实例路径中的一段。
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathArgument {
    /// 普通容器或叶子节点。
    Node(QName),
    /// 列表条目，以键值谓词定位。键按名称排序存放，保证同一条目只有一种表示。
    Entry {
        node: QName,
        keys: Arc<[(QName, Arc<str>)]>,
    },
}

impl PathArgument {
    pub fn node(name: QName) -> Self {
        Self::Node(name)
    }

    /// 构造列表条目；键会被排序。
    pub fn entry<V>(node: QName, keys: impl IntoIterator<Item = (QName, V)>) -> Self
    where
        V: Into<Arc<str>>,
    {
        let mut keys: Vec<(QName, Arc<str>)> = keys
            .into_iter()
            .map(|(name, value)| (name, value.into()))
            .collect();
        keys.sort_by(|left, right| left.0.cmp(&right.0));
        Self::Entry {
            node,
            keys: keys.into(),
        }
    }

    /// 该段对应的节点名。
    pub fn node_name(&self) -> &QName {
        match self {
            Self::Node(name) => name,
            Self::Entry { node, .. } => node,
        }
    }
}

impl fmt::Display for PathArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(name) => f.write_str(name.as_str()),
            Self::Entry { node, keys } => {
                f.write_str(node.as_str())?;
                for (key, value) in keys.iter() {
                    write!(f, "[{key}=")?;
                    for c in value.chars() {
                        if matches!(c, '\\' | '[' | ']') {
                            f.write_char('\\')?;
                        }
                        f.write_char(c)?;
                    }
                    f.write_char(']')?;
                }
                Ok(())
            }
        }
    }
}

/// 数据树中的实例路径，作为 RPC 的上下文引用。
///
/// # 契约说明（What）
/// - 空路径表示全局上下文，[`InstancePath::empty`] 返回共享的同一实例，不做分配；
/// - 两条路径相等当且仅当各段逐一相等。
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstancePath {
    args: Arc<[PathArgument]>,
}

impl InstancePath {
    /// 全局上下文对应的空路径。
    pub fn empty() -> Self {
        EMPTY_INSTANCE_PATH.clone()
    }

    /// 共享空路径的静态引用。
    pub fn empty_ref() -> &'static Self {
        &EMPTY_INSTANCE_PATH
    }

    pub fn from_args(args: impl IntoIterator<Item = PathArgument>) -> Self {
        let args: Vec<PathArgument> = args.into_iter().collect();
        if args.is_empty() {
            return Self::empty();
        }
        Self { args: args.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn args(&self) -> &[PathArgument] {
        &self.args
    }

    /// 追加一段，返回新路径。
    pub fn child(&self, arg: PathArgument) -> Self {
        let mut args = self.args.to_vec();
        args.push(arg);
        Self { args: args.into() }
    }
}

impl Default for InstancePath {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            return f.write_str("/");
        }
        for arg in self.args.iter() {
            write!(f, "/{arg}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstancePath({self})")
    }
}

impl FromStr for InstancePath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PathParseError::Empty);
        }
        let Some(body) = trimmed.strip_prefix('/') else {
            return Err(PathParseError::NotAbsolute(trimmed.to_owned()));
        };
        if body.is_empty() {
            return Ok(Self::empty());
        }
        split_segments(body)
            .into_iter()
            .map(|segment| {
                if segment.is_empty() {
                    Err(PathParseError::EmptySegment(trimmed.to_owned()))
                } else {
                    parse_argument(segment)
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|args| Self::from_args(args))
    }
}

impl TryFrom<String> for InstancePath {
    type Error = PathParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InstancePath> for String {
    fn from(value: InstancePath) -> Self {
        value.to_string()
    }
}

/// 按 `/` 切分，但跳过谓词内部的 `/`；谓词内的转义字符不参与判断。
fn split_segments(body: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut in_predicate = false;
    let mut escaped = false;
    let mut start = 0usize;
    for (index, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_predicate => escaped = true,
            '[' => in_predicate = true,
            ']' => in_predicate = false,
            '/' if !in_predicate => {
                segments.push(&body[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    segments.push(&body[start..]);
    segments
}

fn parse_argument(segment: &str) -> Result<PathArgument, PathParseError> {
    let Some(open) = segment.find('[') else {
        return QName::new(segment).map(PathArgument::Node);
    };
    let node = QName::new(&segment[..open])?;
    let malformed = || PathParseError::MalformedPredicate(segment.to_owned());

    let mut keys = Vec::new();
    let mut rest = &segment[open..];
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[').ok_or_else(malformed)?;
        let (key, after_key) = inner.split_once('=').ok_or_else(malformed)?;
        let key = QName::new(key).map_err(|_| malformed())?;

        let mut value = String::new();
        let mut chars = after_key.char_indices();
        let consumed = loop {
            match chars.next() {
                Some((_, '\\')) => match chars.next() {
                    Some((_, escaped)) => value.push(escaped),
                    None => return Err(malformed()),
                },
                Some((index, ']')) => break index + 1,
                Some((_, '[')) | None => return Err(malformed()),
                Some((_, c)) => value.push(c),
            }
        };
        keys.push((key, Arc::<str>::from(value)));
        rest = &after_key[consumed..];
    }
    Ok(PathArgument::entry(node, keys))
}
