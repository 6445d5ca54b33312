//! Properties every envelope produced by the public API must satisfy.

use textsafe::envelope::{self, TAG};
use textsafe::{ErrorKind, decrypt, encrypt};

#[test]
fn test_example_roundtrip_and_rejection() {
    let s = encrypt("hello world", "correct horse").unwrap();
    assert!(s.starts_with("data:application/octet-binary;base64,"));
    assert_eq!(decrypt(&s, "correct horse").unwrap(), "hello world");

    let err = decrypt(&s, "wrong pass").expect_err("wrong passphrase must fail");
    assert_eq!(err.kind, Some(ErrorKind::DecryptionFailed));
}

#[test]
fn test_roundtrip_assorted_inputs() {
    let cases = [
        ("", "k"),
        ("a", "k"),
        ("multi\nline\r\ntext\twith tabs", "passphrase with spaces"),
        ("data:text/plain,looks like a url", "k"),
        ("日本語のテキスト", "鍵"),
    ];
    for (plaintext, passphrase) in cases {
        let envelope = encrypt(plaintext, passphrase).unwrap();
        assert!(envelope.starts_with(TAG));
        assert_eq!(decrypt(&envelope, passphrase).unwrap(), plaintext);
    }
}

#[test]
fn test_encryption_is_randomized() {
    let e1 = encrypt("same text", "same key").unwrap();
    let e2 = encrypt("same text", "same key").unwrap();

    assert_ne!(e1, e2);
    assert_eq!(decrypt(&e1, "same key").unwrap(), "same text");
    assert_eq!(decrypt(&e2, "same key").unwrap(), "same text");
}

#[test]
fn test_any_flipped_payload_byte_is_rejected() {
    let envelope = encrypt("tamper target", "k").unwrap();
    let payload = envelope::unwrap(&envelope).unwrap();

    // Every position of the salt, nonce, ciphertext and MAC regions.
    for i in 0..payload.len() {
        let mut tampered = payload.clone();
        tampered[i] ^= 0x80;
        let err = decrypt(&envelope::wrap(&tampered), "k")
            .expect_err("tampered envelope must not decrypt");
        assert_eq!(err.kind, Some(ErrorKind::DecryptionFailed), "byte {}", i);
    }
}

#[test]
fn test_truncated_envelope_is_rejected() {
    let envelope = encrypt("truncate me", "k").unwrap();
    let payload = envelope::unwrap(&envelope).unwrap();

    for len in [0, 1, payload.len() / 2, payload.len() - 1] {
        let err = decrypt(&envelope::wrap(&payload[..len]), "k")
            .expect_err("truncated envelope must not decrypt");
        assert_eq!(err.kind, Some(ErrorKind::DecryptionFailed));
    }
}

#[test]
fn test_malformed_input_is_invalid_input() {
    for input in ["not-an-envelope", "", "   ", "data:application/octet-binary"] {
        let err = decrypt(input, "k").expect_err("malformed input must fail");
        assert_eq!(err.kind, Some(ErrorKind::InvalidInput), "input {:?}", input);
    }
}

#[test]
fn test_failures_do_not_reveal_cause() {
    let envelope = encrypt("secret", "right").unwrap();
    let wrong_pass = decrypt(&envelope, "wrong").unwrap_err();

    let mut payload = envelope::unwrap(&envelope).unwrap();
    payload[0] ^= 1;
    let tampered = decrypt(&envelope::wrap(&payload), "right").unwrap_err();

    let garbage = decrypt(&format!("{}!!!", TAG), "right").unwrap_err();

    assert_eq!(wrong_pass.to_string(), tampered.to_string());
    assert_eq!(wrong_pass.to_string(), garbage.to_string());
    assert_eq!(wrong_pass.kind, garbage.kind);
}

#[test]
fn test_concurrent_calls_are_independent() {
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                scope.spawn(move || {
                    let plaintext = format!("message {}", i);
                    let passphrase = format!("key {}", i);
                    let envelope = encrypt(&plaintext, &passphrase).unwrap();
                    (plaintext, passphrase, envelope)
                })
            })
            .collect();

        for handle in handles {
            let (plaintext, passphrase, envelope) = handle.join().unwrap();
            assert_eq!(decrypt(&envelope, &passphrase).unwrap(), plaintext);
        }
    });
}
