/* Firmata reserves the high bit for command bytes; user data is split into
 * 7-bit pairs: (low 7 bits, high bit) */

pub fn encode_7bit_pairs(payload: &[u8]) -> Vec<u8> {
	let mut encoded = Vec::with_capacity(2 * payload.len());
	for &b in payload {
		encoded.push(b & 0x7f);
		encoded.push(b >> 7);
	}
	encoded
}

// a trailing unpaired byte is dropped
pub fn decode_7bit_pairs(encoded: &[u8]) -> Vec<u8> {
	encoded.chunks_exact(2)
		.map(|pair| (pair[0] & 0x7f) | (pair[1] << 7))
		.collect()
}
