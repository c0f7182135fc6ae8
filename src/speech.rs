//! Spoken-text formatting for announcements (Indonesian).

const DIGIT_WORDS: [&str; 10] = [
    "nol", "satu", "dua", "tiga", "empat", "lima", "enam", "tujuh", "delapan", "sembilan",
];

/// Largest value `number_to_words` renders in word form. Anything bigger
/// falls back to digit-by-digit reading so the function stays total.
const MAX_WORD_FORM: u64 = 999_999;

/// Format a ticket number like "A007" for speech: letters spelled out,
/// digits read one at a time ("A nol nol tujuh"). Tickets that are not a
/// letter-prefix + digits pass through unchanged.
pub fn spell_ticket(ticket: &str) -> String {
    let letters: String = ticket.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits: String = ticket[letters.len()..].to_string();
    if letters.is_empty() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return ticket.to_string();
    }

    let mut parts: Vec<String> = letters
        .chars()
        .map(|c| c.to_ascii_uppercase().to_string())
        .collect();
    for d in digits.chars() {
        let idx = (d as u8 - b'0') as usize;
        parts.push(DIGIT_WORDS[idx].to_string());
    }
    parts.join(" ")
}

/// Render an integer as Indonesian words ("dua puluh satu", "seratus").
/// Total over all u64 input: values beyond the supported range are read
/// digit by digit instead of recursing.
pub fn number_to_words(n: u64) -> String {
    if n > MAX_WORD_FORM {
        return n
            .to_string()
            .chars()
            .map(|d| DIGIT_WORDS[(d as u8 - b'0') as usize])
            .collect::<Vec<_>>()
            .join(" ");
    }
    words(n)
}

// Each arm recurses on a strictly smaller value, so this terminates for
// any input below MAX_WORD_FORM.
fn words(n: u64) -> String {
    match n {
        0..=9 => DIGIT_WORDS[n as usize].to_string(),
        10 => "sepuluh".to_string(),
        11 => "sebelas".to_string(),
        12..=19 => format!("{} belas", words(n - 10)),
        20..=99 => {
            let rest = n % 10;
            if rest == 0 {
                format!("{} puluh", words(n / 10))
            } else {
                format!("{} puluh {}", words(n / 10), words(rest))
            }
        }
        100..=199 => {
            if n == 100 {
                "seratus".to_string()
            } else {
                format!("seratus {}", words(n - 100))
            }
        }
        200..=999 => {
            let rest = n % 100;
            if rest == 0 {
                format!("{} ratus", words(n / 100))
            } else {
                format!("{} ratus {}", words(n / 100), words(rest))
            }
        }
        1000..=1999 => {
            if n == 1000 {
                "seribu".to_string()
            } else {
                format!("seribu {}", words(n - 1000))
            }
        }
        _ => {
            let rest = n % 1000;
            if rest == 0 {
                format!("{} ribu", words(n / 1000))
            } else {
                format!("{} ribu {}", words(n / 1000), words(rest))
            }
        }
    }
}

/// Speech form of a counter label. "Loket 3" becomes "Loket tiga"; labels
/// without a trailing number pass through unchanged.
pub fn speak_label(label: &str) -> String {
    let trimmed = label.trim_end();
    let digits: String = trimmed
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if digits.is_empty() {
        return label.to_string();
    }
    let head = &trimmed[..trimmed.len() - digits.len()];
    match digits.parse::<u64>() {
        Ok(n) => format!("{}{}", head, number_to_words(n)),
        Err(_) => label.to_string(),
    }
}

/// Full announcement sentence for one call.
pub fn announcement_text(ticket_number: &str, counter_label: &str) -> String {
    format!(
        "Nomor antrian {}, silakan menuju {}",
        spell_ticket(ticket_number),
        speak_label(counter_label)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spells_letters_and_digits() {
        assert_eq!(spell_ticket("A007"), "A nol nol tujuh");
        assert_eq!(spell_ticket("BP12"), "B P satu dua");
    }

    #[test]
    fn non_matching_tickets_pass_through() {
        assert_eq!(spell_ticket("007"), "007");
        assert_eq!(spell_ticket("VIP"), "VIP");
        assert_eq!(spell_ticket("A-12"), "A-12");
    }

    #[test]
    fn small_numbers() {
        assert_eq!(number_to_words(0), "nol");
        assert_eq!(number_to_words(1), "satu");
        assert_eq!(number_to_words(7), "tujuh");
        assert_eq!(number_to_words(10), "sepuluh");
        assert_eq!(number_to_words(11), "sebelas");
        assert_eq!(number_to_words(17), "tujuh belas");
    }

    #[test]
    fn tens_hundreds_thousands() {
        assert_eq!(number_to_words(21), "dua puluh satu");
        assert_eq!(number_to_words(40), "empat puluh");
        assert_eq!(number_to_words(100), "seratus");
        assert_eq!(number_to_words(105), "seratus lima");
        assert_eq!(number_to_words(250), "dua ratus lima puluh");
        assert_eq!(number_to_words(1000), "seribu");
        assert_eq!(number_to_words(1342), "seribu tiga ratus empat puluh dua");
        assert_eq!(number_to_words(21_000), "dua puluh satu ribu");
    }

    #[test]
    fn total_over_supported_range() {
        // Every value in the ticket domain produces non-empty output.
        for n in 0..=2000 {
            assert!(!number_to_words(n).is_empty());
        }
        // Beyond the bound: digit-by-digit, still non-empty.
        assert_eq!(
            number_to_words(1_000_000),
            "satu nol nol nol nol nol nol"
        );
    }

    #[test]
    fn labels_with_trailing_numbers() {
        assert_eq!(speak_label("Loket 3"), "Loket tiga");
        assert_eq!(speak_label("Loket 12"), "Loket dua belas");
        assert_eq!(speak_label("Kasir Utama"), "Kasir Utama");
    }

    #[test]
    fn announcement_sentence() {
        let text = announcement_text("A007", "Loket 3");
        assert_eq!(
            text,
            "Nomor antrian A nol nol tujuh, silakan menuju Loket tiga"
        );
        assert!(text.contains("A "));
        assert!(text.contains("tujuh"));
        assert!(text.contains("tiga"));
    }
}
