//! `${...}` 占位符解析
//!
//! 支持嵌套占位符（`${outer.${inner}}`）、可配置的默认值分隔符
//! （`${key:fallback}`）与循环占位符引用检测。解析器跨调用无状态，
//! 取值能力由调用方传入。

use std::collections::HashSet;

use crate::constants;
use crate::error::{ContainerError, ContainerResult};

/// 后缀对应的简单前缀，用于嵌套深度跟踪，例如 `}` 配对 `{`
fn simple_prefix_for(suffix: &str) -> Option<&'static str> {
    match suffix {
        "}" => Some("{"),
        "]" => Some("["),
        ")" => Some("("),
        _ => None,
    }
}

/// 占位符解析器
#[derive(Debug, Clone)]
pub struct PlaceholderHelper {
    prefix: String,
    suffix: String,
    simple_prefix: String,
    value_separator: Option<String>,
    ignore_unresolvable: bool,
}

impl PlaceholderHelper {
    /// 使用给定前缀和后缀创建解析器，无法解析的占位符会报错
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let suffix = suffix.into();
        let simple_prefix = match simple_prefix_for(&suffix) {
            Some(simple) if prefix.ends_with(simple) => simple.to_string(),
            _ => prefix.clone(),
        };
        Self {
            prefix,
            suffix,
            simple_prefix,
            value_separator: Some(constants::VALUE_SEPARATOR.to_string()),
            ignore_unresolvable: false,
        }
    }

    pub fn with_value_separator(mut self, separator: Option<impl Into<String>>) -> Self {
        self.value_separator = separator.map(Into::into);
        self
    }

    /// 无法解析的占位符原样保留，不报错
    pub fn ignoring_unresolvable(mut self) -> Self {
        self.ignore_unresolvable = true;
        self
    }

    /// 用 `resolver` 返回的值替换所有占位符
    ///
    /// 解析出来的值本身还会继续扫描占位符；当前调用栈上正在展开的键
    /// 被再次访问时返回 [`ContainerError::CircularPlaceholder`]。
    pub fn replace<F>(&self, value: &str, resolver: &F) -> ContainerResult<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut visited = HashSet::new();
        self.parse(value, resolver, &mut visited)
    }

    fn parse<F>(
        &self,
        value: &str,
        resolver: &F,
        visited: &mut HashSet<String>,
    ) -> ContainerResult<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut result = value.to_string();

        let mut start_index = result.find(&self.prefix);
        while let Some(start) = start_index {
            let Some(end) = self.find_placeholder_end(&result, start) else {
                break;
            };

            let placeholder = result[start + self.prefix.len()..end].to_string();
            let original = placeholder.clone();
            if !visited.insert(original.clone()) {
                return Err(ContainerError::CircularPlaceholder(original));
            }

            // 键本身可能包含占位符，先展开键
            let placeholder = self.parse(&placeholder, resolver, visited)?;

            let mut prop_val = resolver(&placeholder);
            if prop_val.is_none() {
                if let Some(separator) = &self.value_separator {
                    if let Some(sep_idx) = placeholder.find(separator.as_str()) {
                        let actual = &placeholder[..sep_idx];
                        let default_value = placeholder[sep_idx + separator.len()..].to_string();
                        prop_val = resolver(actual).or(Some(default_value));
                    }
                }
            }

            match prop_val {
                Some(val) => {
                    // 解析出的值可能还有占位符，继续递归展开
                    let val = self.parse(&val, resolver, visited)?;
                    result.replace_range(start..end + self.suffix.len(), &val);
                    tracing::trace!("Resolved placeholder '{}'", placeholder);
                    start_index = result[start + val.len()..]
                        .find(&self.prefix)
                        .map(|idx| idx + start + val.len());
                }
                None if self.ignore_unresolvable => {
                    // 保留未处理的占位符，继续向后扫描
                    let next = end + self.suffix.len();
                    start_index = result[next..].find(&self.prefix).map(|idx| idx + next);
                }
                None => {
                    return Err(ContainerError::UnresolvedPlaceholder(format!(
                        "{placeholder}' in value '{value}"
                    )));
                }
            }

            visited.remove(&original);
        }

        Ok(result)
    }

    /// 找到与 `start` 处前缀配对的后缀下标，嵌套的占位符成对跳过
    fn find_placeholder_end(&self, buf: &str, start: usize) -> Option<usize> {
        let mut index = start + self.prefix.len();
        let mut within_nested = 0usize;
        while index < buf.len() {
            if buf[index..].starts_with(&self.suffix) {
                if within_nested > 0 {
                    within_nested -= 1;
                    index += self.suffix.len();
                } else {
                    return Some(index);
                }
            } else if buf[index..].starts_with(&self.simple_prefix) {
                within_nested += 1;
                index += self.simple_prefix.len();
            } else {
                index += buf[index..].chars().next().map_or(1, |c| c.len_utf8());
            }
        }
        None
    }
}

impl Default for PlaceholderHelper {
    fn default() -> Self {
        Self::new(constants::PLACEHOLDER_PREFIX, constants::PLACEHOLDER_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(map: &'a HashMap<&str, &str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn test_simple_replacement() {
        let helper = PlaceholderHelper::default();
        let props: HashMap<&str, &str> = [("name", "alpha")].into();
        assert_eq!(
            helper.replace("hello ${name}", &lookup(&props)).unwrap(),
            "hello alpha"
        );
    }

    #[test]
    fn test_nested_key_with_default() {
        let helper = PlaceholderHelper::default();

        let props: HashMap<&str, &str> =
            [("region", "eu"), ("url.eu", "https://eu.example")].into();
        assert_eq!(
            helper
                .replace("${url.${region}:unknown}", &lookup(&props))
                .unwrap(),
            "https://eu.example"
        );

        // region 未设置时计算出的键查不到，落到默认值
        let props: HashMap<&str, &str> = [("url.eu", "https://eu.example")].into();
        assert_eq!(
            helper
                .replace("${url.${region:us}:unknown}", &lookup(&props))
                .unwrap(),
            "unknown"
        );
    }

    #[test]
    fn test_default_value_containing_placeholder() {
        let helper = PlaceholderHelper::default();
        let props: HashMap<&str, &str> = [("env.DB_URL", "postgres://db")].into();
        assert_eq!(
            helper
                .replace("${jdbc.url:${env.DB_URL:postgres://localhost}}", &lookup(&props))
                .unwrap(),
            "postgres://db"
        );

        let props: HashMap<&str, &str> = HashMap::new();
        assert_eq!(
            helper
                .replace("${jdbc.url:${env.DB_URL:postgres://localhost}}", &lookup(&props))
                .unwrap(),
            "postgres://localhost"
        );
    }

    #[test]
    fn test_resolved_value_is_expanded_recursively() {
        let helper = PlaceholderHelper::default();
        let props: HashMap<&str, &str> = [("a", "${b}"), ("b", "final")].into();
        assert_eq!(helper.replace("${a}", &lookup(&props)).unwrap(), "final");
    }

    #[test]
    fn test_circular_reference_is_detected() {
        let helper = PlaceholderHelper::default();
        let props: HashMap<&str, &str> = [("a", "${b}"), ("b", "${a}")].into();
        let err = helper.replace("${a}", &lookup(&props)).unwrap_err();
        assert!(matches!(err, ContainerError::CircularPlaceholder(_)));
    }

    #[test]
    fn test_unresolvable_fails_or_is_ignored() {
        let props: HashMap<&str, &str> = HashMap::new();

        let strict = PlaceholderHelper::default();
        let err = strict.replace("${missing}", &lookup(&props)).unwrap_err();
        assert!(matches!(err, ContainerError::UnresolvedPlaceholder(_)));

        let lenient = PlaceholderHelper::default().ignoring_unresolvable();
        assert_eq!(
            lenient.replace("${missing}", &lookup(&props)).unwrap(),
            "${missing}"
        );
    }

    #[test]
    fn test_multiple_placeholders_in_one_value() {
        let helper = PlaceholderHelper::default();
        let props: HashMap<&str, &str> = [("host", "localhost"), ("port", "5432")].into();
        assert_eq!(
            helper
                .replace("${host}:${port}/db", &lookup(&props))
                .unwrap(),
            "localhost:5432/db"
        );
    }

    #[test]
    fn test_idempotent_expansion() {
        // 键之间没有重叠时 expand(expand(s)) == expand(s)
        let helper = PlaceholderHelper::default().ignoring_unresolvable();
        let props: HashMap<&str, &str> = [("a", "plain")].into();
        let once = helper.replace("x ${a} ${gone}", &lookup(&props)).unwrap();
        let twice = helper.replace(&once, &lookup(&props)).unwrap();
        assert_eq!(once, twice);
    }
}
