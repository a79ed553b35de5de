use rand::Rng;

pub const OTP_TTL_MINUTES: i64 = 10;

/// 6-digit code, never starting with a leading zero.
pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    n.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
