use rand::{rngs::OsRng, Rng, RngCore};

/// 推荐码字符集: A-Z + 0-9，36个符号
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// 首次生成的推荐码长度(36^6约22亿的空间)
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// 生成指定长度的随机推荐码
pub fn generate(length: usize) -> String {
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// 碰撞重试耗尽后的兜底推荐码: "REF" + 5字节强随机数的大写hex
///
/// 不再回查数据库，唯一索引兜底
pub fn fallback() -> String {
    let mut bytes = [0u8; 5];
    OsRng.fill_bytes(&mut bytes);

    format!("REF{}", hex::encode_upper(bytes))
}
