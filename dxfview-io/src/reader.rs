//! DXF 文本到 (组码, 值) 序列的切分，以及在序列上移动的游标。

/// 一个 (组码, 值) 对。组码行无法解析为整数时 `code` 为 `None`，不会匹配任何组码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
    code: Option<i32>,
    value: &'a str,
}

impl<'a> Tag<'a> {
    #[inline]
    pub fn new(code: Option<i32>, value: &'a str) -> Self {
        Self { code, value }
    }

    #[inline]
    pub fn code(&self) -> Option<i32> {
        self.code
    }

    #[inline]
    pub fn value(&self) -> &'a str {
        self.value
    }

    #[inline]
    pub fn has_code(&self, code: i32) -> bool {
        self.code == Some(code)
    }

    /// 组码 0 标记一个实体/段落的开始。
    #[inline]
    pub fn is_marker(&self) -> bool {
        self.has_code(0)
    }

    #[inline]
    pub fn is_marker_named(&self, name: &str) -> bool {
        self.is_marker() && self.value == name
    }

    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        self.value.parse::<f64>().ok()
    }

    #[inline]
    pub fn as_i32(&self) -> Option<i32> {
        self.value.parse::<i32>().ok()
    }
}

/// 将整段文本切分为组码/值对。
///
/// 换行符兼容 `\r\n`、`\r` 与 `\n`；每行去除首尾空白后两两配对，
/// 行数为奇数时丢弃最后一行。该过程不会失败。
pub fn tokenize(source: &str) -> Vec<Tag<'_>> {
    split_lines(source)
        .chunks_exact(2)
        .map(|pair| {
            let code = pair[0].trim().parse::<i32>().ok();
            Tag::new(code, pair[1].trim())
        })
        .collect()
}

/// 与正则 `\r\n|\r|\n` 的 split 一致：结尾的换行符会产生一个空行。
fn split_lines(source: &str) -> Vec<&str> {
    let bytes = source.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'\n' => {
                lines.push(&source[start..index]);
                index += 1;
                start = index;
            }
            b'\r' => {
                lines.push(&source[start..index]);
                index += 1;
                if bytes.get(index) == Some(&b'\n') {
                    index += 1;
                }
                start = index;
            }
            _ => index += 1,
        }
    }
    lines.push(&source[start..]);
    lines
}

/// 组码序列上的只进游标。
#[derive(Debug, Clone)]
pub struct TagCursor<'t, 'a> {
    tags: &'t [Tag<'a>],
    position: usize,
}

impl<'t, 'a> TagCursor<'t, 'a> {
    pub fn new(tags: &'t [Tag<'a>]) -> Self {
        Self { tags, position: 0 }
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.position >= self.tags.len()
    }

    #[inline]
    pub fn peek(&self) -> Option<Tag<'a>> {
        self.tags.get(self.position).copied()
    }

    /// 消费从当前位置到下一个组码 0（不含）之间的所有组码，返回这段切片。
    pub fn take_body(&mut self) -> &'t [Tag<'a>] {
        let rest = &self.tags[self.position..];
        let len = rest
            .iter()
            .position(Tag::is_marker)
            .unwrap_or(rest.len());
        self.position += len;
        &rest[..len]
    }
}

impl<'t, 'a> Iterator for TagCursor<'t, 'a> {
    type Item = Tag<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.peek()?;
        self.position += 1;
        Some(tag)
    }
}
