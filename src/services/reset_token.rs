use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha512};

/// リセットトークンのバイト長（256ビット）
const RESET_TOKEN_BYTES: usize = 32;

/// ランダムなリセットトークンを生成（Base64URL、パディングなし）
///
/// 平文トークンはメールでのみ送信し、保存・ログ出力しない
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// トークンを SHA-512 でハッシュ化（16進小文字）
///
/// 検索用の一方向ハッシュ。秘匿性は平文トークン側で担保する
pub fn hash_reset_token(token: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_reset_token() {
        let token = generate_reset_token();
        // 32バイトのBase64URL（パディングなし）= 43文字
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(token, generate_reset_token());
    }

    #[test]
    fn test_hash_reset_token() {
        let hash = hash_reset_token("token");
        assert_eq!(hash.len(), 128);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(hash, hash_reset_token("token"));
        assert_ne!(hash, hash_reset_token("token2"));
    }

    #[test]
    fn test_hash_known_vector() {
        // SHA-512("abc")
        assert_eq!(
            hash_reset_token("abc"),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
    }
}
