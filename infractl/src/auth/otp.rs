//! Time-based one-time passwords (RFC 6238, HMAC-SHA1) on top of `totp-rs`.
//!
//! Secrets are 20 random bytes. They are handed to authenticator apps base32-encoded inside an
//! `otpauth://totp/...` URI and stored encrypted (see [`crate::crypto::SecretCipher`]).

use anyhow::anyhow;
use totp_rs::{Algorithm, Secret, TOTP};

use crate::config::OtpConfig;

/// Code length, period and accepted clock skew.
#[derive(Debug, Clone, Copy)]
pub struct OtpSettings {
    pub digits: u32,
    pub period_secs: u64,
    pub skew: u32,
}

impl From<&OtpConfig> for OtpSettings {
    fn from(config: &OtpConfig) -> Self {
        Self {
            digits: config.digits,
            period_secs: config.period.as_secs().max(1),
            skew: config.skew,
        }
    }
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            digits: 6,
            period_secs: 30,
            skew: 1,
        }
    }
}

fn build(secret: Vec<u8>, settings: OtpSettings, issuer: Option<String>, account: String) -> anyhow::Result<TOTP> {
    TOTP::new(
        Algorithm::SHA1,
        settings.digits as usize,
        u8::try_from(settings.skew).unwrap_or(u8::MAX),
        settings.period_secs,
        secret,
        issuer,
        account,
    )
    .map_err(|e| anyhow!("Invalid OTP parameters: {e:?}"))
}

fn decode(secret_b32: &str) -> anyhow::Result<Vec<u8>> {
    Secret::Encoded(secret_b32.trim().to_ascii_uppercase())
        .to_bytes()
        .map_err(|e| anyhow!("Invalid OTP secret: {e:?}"))
}

/// Fresh random secret, base32 encoded.
pub fn generate_secret() -> String {
    Secret::generate_secret().to_encoded().to_string()
}

/// The code valid at unix time `now`.
pub fn code_at(secret_b32: &str, now: u64, settings: OtpSettings) -> anyhow::Result<String> {
    Ok(build(decode(secret_b32)?, settings, None, String::new())?.generate(now))
}

/// Check `code` against the window `now ± skew periods`.
pub fn verify(secret_b32: &str, code: &str, now: u64, settings: OtpSettings) -> bool {
    let code = code.trim();
    if code.len() != settings.digits as usize || !code.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    decode(secret_b32)
        .and_then(|secret| build(secret, settings, None, String::new()))
        .is_ok_and(|totp| totp.check(code, now))
}

/// Provisioning URI understood by authenticator apps.
pub fn format_otp_token(issuer: &str, account: &str, secret_b32: &str, settings: OtpSettings) -> anyhow::Result<String> {
    Ok(build(decode(secret_b32)?, settings, Some(issuer.to_string()), account.to_string())?.get_url())
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 6238 appendix B, SHA-1 seed "12345678901234567890"
    const RFC_SECRET_B32: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    fn eight_digits() -> OtpSettings {
        OtpSettings {
            digits: 8,
            period_secs: 30,
            skew: 0,
        }
    }

    #[test]
    fn test_rfc6238_vectors() {
        let cases = [
            (59, "94287082"),
            (1111111109, "07081804"),
            (1111111111, "14050471"),
            (1234567890, "89005924"),
            (2000000000, "69279037"),
        ];
        for (time, expected) in cases {
            assert_eq!(code_at(RFC_SECRET_B32, time, eight_digits()).unwrap(), expected, "time {time}");
            assert!(verify(RFC_SECRET_B32, expected, time, eight_digits()), "time {time}");
        }
    }

    #[test]
    fn test_six_digit_codes_are_suffixes() {
        assert_eq!(code_at(RFC_SECRET_B32, 59, OtpSettings::default()).unwrap(), "287082");
    }

    #[test]
    fn test_verify_accepts_skew_and_rejects_garbage() {
        let settings = OtpSettings::default();
        let code = code_at(RFC_SECRET_B32, 1_000_000, settings).unwrap();

        assert!(verify(RFC_SECRET_B32, &code, 1_000_000, settings));
        assert!(verify(RFC_SECRET_B32, &code, 1_000_030, settings));
        assert!(!verify(RFC_SECRET_B32, &code, 1_000_090, settings));
        assert!(!verify(RFC_SECRET_B32, "12345", 1_000_000, settings));
        assert!(!verify(RFC_SECRET_B32, "abcdef", 1_000_000, settings));
        assert!(!verify("not base32!", &code, 1_000_000, settings));
    }

    #[test]
    fn test_generated_secret_decodes_to_twenty_bytes() {
        let secret = generate_secret();
        assert_eq!(decode(&secret).unwrap().len(), 20);
    }

    #[test]
    fn test_provisioning_uri() {
        let uri = format_otp_token("InfraCtl", "alice", RFC_SECRET_B32, OtpSettings::default()).unwrap();
        assert!(uri.starts_with("otpauth://totp/InfraCtl:alice?"));
        assert!(uri.contains(&format!("secret={RFC_SECRET_B32}")));
        assert!(uri.contains("issuer=InfraCtl"));
    }
}
