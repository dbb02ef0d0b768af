//! 정책 라인 텍스트 포맷
//!
//! `p, alice, data1, read` 형태의 쉼표+공백 구분 라인을 만들고 파싱합니다.
//! 쉼표나 큰따옴표를 포함한 필드는 CSV 방식으로 따옴표 처리합니다.

use crate::error::{Error, Result};

/// 필드 목록을 라인 텍스트로 결합
pub fn join<'a, I>(fields: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = String::new();
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        if needs_quotes(field) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out
}

/// 라인 텍스트를 필드 목록으로 분리
///
/// 빈 라인과 `#` 주석 라인은 None. 닫히지 않은 따옴표는 `MalformedLine`.
pub fn split(line: &str) -> Result<Option<Vec<String>>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let mut fields = Vec::new();
    let mut chars = trimmed.chars().peekable();

    loop {
        while chars.next_if(|c| *c == ' ' || *c == '\t').is_some() {}

        let mut field = String::new();
        if chars.next_if_eq(&'"').is_some() {
            // 따옴표 필드
            loop {
                match chars.next() {
                    Some('"') if chars.next_if_eq(&'"').is_some() => field.push('"'),
                    Some('"') => break,
                    Some(c) => field.push(c),
                    None => return Err(Error::malformed(line, "unterminated quoted field")),
                }
            }
            while chars.next_if(|c| *c != ',').is_some() {}
        } else {
            while let Some(c) = chars.next_if(|c| *c != ',') {
                field.push(c);
            }
            field = field.trim_end().to_string();
        }
        fields.push(field);

        if chars.next().is_none() {
            break;
        }
    }

    Ok(Some(fields))
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',')
        || field.contains('"')
        || field.starts_with(char::is_whitespace)
        || field.ends_with(char::is_whitespace)
}
