/// 댓글 본문에서 입찰 금액 추출
/// 대부분의 댓글은 입찰이 아니므로, 금액을 못 찾는 것은 오류가 아니라 정상 경로다.
// region:    --- Parser

/// 자유 서식 텍스트에서 양의 정수 입찰액을 뽑는다.
///
/// 통화 기호와 공백은 무시하고, 숫자 묶음 사이의 단일 구분자(`,` `.` 공백)는
/// 뒤 묶음이 정확히 세 자리일 때만 천 단위 구분자로 이어 붙인다.
/// 해석 불가능하면 None (조용히 무시).
pub fn parse_bid(text: &str) -> Option<i64> {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        // 첫 숫자 묶음
        let mut digits = String::new();
        while i < chars.len() && chars[i].is_ascii_digit() {
            digits.push(chars[i]);
            i += 1;
        }

        // 천 단위 구분자로 이어지는 세 자리 묶음 흡수
        while i + 1 < chars.len()
            && matches!(chars[i], ',' | '.' | ' ' | '\u{a0}' | '_')
            && chars[i + 1].is_ascii_digit()
        {
            let mut group = String::new();
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_ascii_digit() {
                group.push(chars[j]);
                j += 1;
            }
            if group.len() != 3 {
                break;
            }
            digits.push_str(&group);
            i = j;
        }

        match digits.parse::<i64>() {
            Ok(amount) if amount > 0 => return Some(amount),
            _ => continue,
        }
    }

    None
}

// endregion: --- Parser

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;

    /// 순수 숫자
    #[test]
    fn test_plain_number() {
        assert_eq!(parse_bid("1500"), Some(1500));
        assert_eq!(parse_bid("  250 "), Some(250));
    }

    /// 통화 기호와 주변 텍스트
    #[test]
    fn test_currency_and_noise() {
        assert_eq!(parse_bid("입찰 500원이요"), Some(500));
        assert_eq!(parse_bid("₩2000"), Some(2000));
        assert_eq!(parse_bid("ставлю 750₽"), Some(750));
    }

    /// 천 단위 구분자
    #[test]
    fn test_thousand_separators() {
        assert_eq!(parse_bid("1,500"), Some(1500));
        assert_eq!(parse_bid("1.500"), Some(1500));
        assert_eq!(parse_bid("12 000"), Some(12000));
        assert_eq!(parse_bid("1,234,567"), Some(1234567));
    }

    /// 세 자리가 아니면 구분자로 보지 않는다
    #[test]
    fn test_separator_requires_three_digit_group() {
        assert_eq!(parse_bid("1.5"), Some(1));
        assert_eq!(parse_bid("10,25"), Some(10));
    }

    /// 입찰이 아닌 댓글
    #[test]
    fn test_no_bid_found() {
        assert_eq!(parse_bid("멋진 상품이네요!"), None);
        assert_eq!(parse_bid(""), None);
        assert_eq!(parse_bid("0"), None);
        assert_eq!(parse_bid("0원"), None);
    }
}
// endregion: --- Tests
