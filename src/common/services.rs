/*
 * This file is part of the Obvia ERP.
 *
 * Copyright (C) 2025 Kovács Dávid <kapcsolat@kovacsdavid.dev>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */
use rand::Rng;
use rand::rngs::OsRng;

const CSPRNG_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Generates an alphanumeric string of the given length from a CSPRNG, suitable for
/// invite tokens, one-time activation codes, and similar short-lived secrets.
pub fn generate_string_csprng(len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| {
            let idx = rng.random_range(0..CSPRNG_ALPHABET.len());
            CSPRNG_ALPHABET[idx] as char
        })
        .collect()
}

/// Generates a hex-encoded secret with at least `min_bytes` bytes of entropy, used to
/// fill in `JWT_SECRET`/`SESSION_SECRET`-style placeholders in generated tenant env files.
pub fn generate_hex_secret(min_bytes: usize) -> String {
    let mut rng = OsRng;
    let mut bytes = vec![0u8; min_bytes];
    rng.fill(bytes.as_mut_slice());
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csprng_string_has_requested_length() {
        assert_eq!(generate_string_csprng(40).len(), 40);
    }

    #[test]
    fn csprng_string_uses_only_alphabet_chars() {
        let s = generate_string_csprng(200);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn hex_secret_has_expected_length() {
        assert_eq!(generate_hex_secret(32).len(), 64);
    }

    #[test]
    fn hex_secret_is_lowercase_hex() {
        let s = generate_hex_secret(16);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
