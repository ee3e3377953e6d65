use pqc_engine::{
    ConfigError, ContextState, CryptoContext, DebugLevel, DecodeError, Error, ErrorCode, FLAG_MORE,
    FlagError, KeyClass, KeyCoding, KeyStateError, Operation, Padding, Result, SchemeId, word0,
    word1,
};
use std::num::NonZeroUsize;

// ----- Signature Scenarios -----

#[test]
fn test_signature_scenario_defaults() -> Result<()> {
    // Highest Dilithium level with every flag at its default
    let mut ctx = CryptoContext::create(SchemeId::SigDilithium, 2, &[0])?;
    assert_eq!(ctx.parameter_set().name, "Dilithium5");

    ctx.keygen()?;
    let public = ctx.public_key_encode()?;
    assert!(!public.is_empty());

    let message = [0x5Au8; 64];
    let signature = ctx.sign(&message)?;
    assert!(ctx.verify(&message, &signature)?);

    let mut tampered = message;
    tampered[0] ^= 0x01;
    assert!(!ctx.verify(&tampered, &signature)?);

    assert!(ctx.errors().is_empty());
    Ok(())
}

#[test]
fn test_sign_before_keygen_fails() -> Result<()> {
    let mut ctx = CryptoContext::create(SchemeId::SigDilithium, 0, &[])?;
    match ctx.sign(b"too early") {
        Err(Error::KeyState(KeyStateError::Absent(KeyClass::Private))) => {}
        other => panic!("Expected absent private key, got {:?}", other),
    }
    assert_eq!(ctx.state(), ContextState::Initialized);
    Ok(())
}

#[test]
fn test_verify_with_loaded_public_key() -> Result<()> {
    let mut signer = CryptoContext::create(SchemeId::SigDilithium, 1, &[])?;
    signer.keygen()?;
    let public = signer.public_key_encode()?;
    let signature = signer.sign(b"detached")?;

    let mut verifier = CryptoContext::create(SchemeId::SigDilithium, 1, &[])?;
    verifier.public_key_load(&public)?;
    assert_eq!(verifier.state(), ContextState::KeyReady);
    assert!(verifier.verify(b"detached", &signature)?);

    // Only the public slot was loaded
    assert!(verifier.sign(b"detached").is_err());
    Ok(())
}

#[test]
fn test_coded_signatures() -> Result<()> {
    for flags in [word0::ENTROPY_BAC, word0::ENTROPY_BAC_RLE, word0::ENTROPY_HUFFMAN_STATIC] {
        let mut ctx = CryptoContext::create(SchemeId::SigDilithium, 0, &[flags])?;
        assert_ne!(ctx.signature_coding(), KeyCoding::None);

        ctx.keygen()?;
        let signature = ctx.sign(b"coded")?;
        assert!(ctx.verify(b"coded", &signature)?);

        // A truncated envelope is a rejected signature, not an error
        assert!(!ctx.verify(b"coded", &signature[..3])?);
    }
    Ok(())
}

// ----- Key Coding Scenarios -----

#[test]
fn test_private_key_huffman_reload() -> Result<()> {
    let mut ctx = CryptoContext::create(SchemeId::SigDilithium, 0, &[])?;
    ctx.keygen()?;
    ctx.set_key_coding(KeyCoding::None, KeyCoding::HuffmanStatic);

    let first = ctx.private_key_encode()?;
    ctx.private_key_load(&first)?;
    let second = ctx.private_key_encode()?;
    assert_eq!(&first[..], &second[..]);

    // The reloaded key still signs for the existing public key
    let signature = ctx.sign(b"reloaded")?;
    assert!(ctx.verify(b"reloaded", &signature)?);
    Ok(())
}

#[test]
fn test_key_round_trip_every_coding() -> Result<()> {
    let mut source = CryptoContext::create(SchemeId::KemKyber, 0, &[])?;
    source.keygen()?;

    for coding in KeyCoding::ALL {
        source.set_key_coding(coding, coding);
        let public = source.public_key_encode()?;
        let private = source.private_key_encode()?;

        let mut target = CryptoContext::create(SchemeId::KemKyber, 0, &[])?;
        target.set_key_coding(coding, coding);
        target.public_key_load(&public)?;
        target.private_key_load(&private)?;

        assert_eq!(target.public_key_encode()?, public);
        assert_eq!(&target.private_key_encode()?[..], &private[..]);
    }
    Ok(())
}

#[test]
fn test_load_rejects_wrong_coding_and_slot() -> Result<()> {
    let mut ctx = CryptoContext::create(SchemeId::SigDilithium, 0, &[])?;
    ctx.keygen()?;
    ctx.set_key_coding(KeyCoding::Bac, KeyCoding::None);
    let public = ctx.public_key_encode()?;

    ctx.set_key_coding(KeyCoding::None, KeyCoding::None);
    assert!(matches!(
        ctx.public_key_load(&public),
        Err(Error::Decode(DecodeError::CodingMismatch { .. }))
    ));

    let private = ctx.private_key_encode()?;
    assert!(matches!(
        ctx.public_key_load(&private),
        Err(Error::Decode(DecodeError::KeyClassMismatch { .. }))
    ));

    let mut other = CryptoContext::create(SchemeId::SigDilithium, 1, &[])?;
    assert!(matches!(
        other.private_key_load(&private),
        Err(Error::Decode(DecodeError::SchemeMismatch))
    ));
    Ok(())
}

// ----- Encryption and KEM -----

#[test]
fn test_hybrid_encryption_round_trip() -> Result<()> {
    let mut ctx = CryptoContext::create(SchemeId::EncKyberHybrid, 1, &[])?;
    ctx.keygen()?;

    let padding = Padding::Iso7816(NonZeroUsize::new(16).unwrap());
    let ciphertext = ctx.public_encrypt(b"attack at dawn", padding)?;
    let plaintext = ctx.private_decrypt(&ciphertext, padding)?;
    assert_eq!(&plaintext[..], b"attack at dawn");

    let stats = ctx.statistics();
    assert_eq!(stats.encryptions, 1);
    assert_eq!(stats.decryptions, 1);
    Ok(())
}

#[test]
fn test_hybrid_tampering_is_generic() -> Result<()> {
    let mut ctx = CryptoContext::create(SchemeId::EncKyberHybrid, 0, &[])?;
    ctx.keygen()?;

    let mut ciphertext = ctx.public_encrypt(b"payload", Padding::None)?;
    let last = ciphertext.len() - 1;
    ciphertext[last] ^= 0xFF;
    assert!(matches!(
        ctx.private_decrypt(&ciphertext, Padding::None),
        Err(Error::CryptoOp)
    ));
    assert!(matches!(
        ctx.private_decrypt(&ciphertext[..10], Padding::None),
        Err(Error::CryptoOp)
    ));
    assert_eq!(ctx.errors().len(), 2);
    Ok(())
}

#[test]
fn test_hybrid_with_chosen_hash_and_csprng() -> Result<()> {
    let flags = [
        (2 << word0::HASH_FUNCTION_SHIFT) | (1 << word0::HASH_LENGTH_SHIFT) | FLAG_MORE,
        word1::CHACHA,
    ];
    let mut ctx = CryptoContext::create(SchemeId::EncKyberHybrid, 2, &flags)?;
    ctx.keygen()?;

    let ciphertext = ctx.public_encrypt(&[0u8; 300], Padding::None)?;
    assert_eq!(&ctx.private_decrypt(&ciphertext, Padding::None)?[..], &[0u8; 300][..]);
    Ok(())
}

#[test]
fn test_kem_round_trip() -> Result<()> {
    let mut receiver = CryptoContext::create(SchemeId::KemKyber, 2, &[])?;
    receiver.keygen()?;
    let public = receiver.public_key_encode()?;

    let mut sender = CryptoContext::create(SchemeId::KemKyber, 2, &[])?;
    sender.public_key_load(&public)?;
    let (ciphertext, sender_secret) = sender.encapsulate()?;

    let receiver_secret = receiver.decapsulate(&ciphertext)?;
    assert_eq!(&sender_secret[..], &receiver_secret[..]);
    assert_eq!(sender.statistics().encapsulations, 1);
    assert_eq!(receiver.statistics().decapsulations, 1);
    Ok(())
}

#[test]
fn test_kem_rejects_signing() -> Result<()> {
    let mut ctx = CryptoContext::create(SchemeId::KemKyber, 0, &[])?;
    ctx.keygen()?;
    match ctx.sign(b"nope") {
        Err(Error::Unsupported { scheme, operation }) => {
            assert_eq!(scheme, SchemeId::KemKyber);
            assert_eq!(operation, Operation::Sign);
        }
        other => panic!("Expected Unsupported error, got {:?}", other),
    }
    assert_eq!(ctx.peek_error().unwrap().code, ErrorCode::Unsupported);
    Ok(())
}

// ----- Configuration -----

#[test]
fn test_reserved_reduction_rejected() {
    for code in 4..8u32 {
        let result = CryptoContext::create(
            SchemeId::SigDilithium,
            0,
            &[code << word0::REDUCTION_SHIFT],
        );
        match result {
            Err(Error::Config(ConfigError::Flags(FlagError::InvalidField(field)))) => {
                assert_eq!(field, "reduction");
            }
            other => panic!("Expected reduction flag error, got {:?}", other),
        }
    }
}

#[test]
fn test_unknown_parameter_set() {
    match CryptoContext::create(SchemeId::KemKyber, 3, &[]) {
        Err(Error::Config(ConfigError::UnknownParameterSet { scheme, param_set })) => {
            assert_eq!(scheme, SchemeId::KemKyber);
            assert_eq!(param_set, 3);
        }
        other => panic!("Expected unknown parameter set, got {:?}", other),
    }
}

#[test]
fn test_flag_errors_precede_scheme_lookup() {
    // Both the flags and the scheme are bad; the flags are reported
    let result = CryptoContext::create(SchemeId::SigBliss, 9, &[word0::ENTROPY_BAC | 0x80]);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::Flags(FlagError::ReservedBits { word: 0, .. })))
    ));
}

#[test]
fn test_missing_flag_word() {
    let result = CryptoContext::create(
        SchemeId::SigDilithium,
        0,
        &[FLAG_MORE],
    );
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::Flags(FlagError::MissingWord(1))))
    ));
}

#[test]
fn test_builder_settings() -> Result<()> {
    let ctx = CryptoContext::builder(SchemeId::SigDilithium, 0)
        .flags(&[word0::ENTROPY_HUFFMAN_STATIC])
        .debug_level(DebugLevel::Info)
        .key_coding(KeyCoding::BacRle, KeyCoding::StrongSwan)
        .build()?;

    assert_eq!(ctx.debug_level(), DebugLevel::Info);
    assert_eq!(ctx.key_coding(), (KeyCoding::BacRle, KeyCoding::StrongSwan));
    assert_eq!(ctx.signature_coding(), KeyCoding::HuffmanStatic);
    assert!(ctx.features().entropy.huffman_static);
    Ok(())
}

// ----- Error Stack and Lifecycle -----

#[test]
fn test_each_failure_adds_one_record() -> Result<()> {
    let mut ctx = CryptoContext::create(SchemeId::EncKyberHybrid, 0, &[])?;

    let failures: Vec<Box<dyn Fn(&mut CryptoContext) -> bool>> = vec![
        Box::new(|c: &mut CryptoContext| c.public_key_encode().is_err()),
        Box::new(|c: &mut CryptoContext| c.private_key_encode().is_err()),
        Box::new(|c: &mut CryptoContext| c.public_encrypt(b"x", Padding::None).is_err()),
        Box::new(|c: &mut CryptoContext| c.private_decrypt(b"x", Padding::None).is_err()),
        Box::new(|c: &mut CryptoContext| c.sign(b"x").is_err()),
        Box::new(|c: &mut CryptoContext| c.verify(b"x", b"y").is_err()),
        Box::new(|c: &mut CryptoContext| c.encapsulate().is_err()),
        Box::new(|c: &mut CryptoContext| c.decapsulate(b"x").is_err()),
        Box::new(|c: &mut CryptoContext| c.public_key_load(b"").is_err()),
        Box::new(|c: &mut CryptoContext| c.private_key_load(b"").is_err()),
    ];

    for (i, fails) in failures.iter().enumerate() {
        assert!(fails(&mut ctx), "operation {} should fail", i);
        assert_eq!(ctx.errors().len(), i + 1);
    }

    let (code, file, line) = ctx.get_error_line().unwrap();
    assert_eq!(code, ErrorCode::KeyAbsent);
    assert!(file.contains("context"));
    assert!(line > 0);
    Ok(())
}

#[test]
fn test_clear_error() -> Result<()> {
    let mut ctx = CryptoContext::create(SchemeId::SigDilithium, 0, &[])?;
    let _ = ctx.sign(b"a");
    let _ = ctx.sign(b"b");
    assert_eq!(ctx.errors().len(), 2);

    ctx.clear_error();
    assert!(ctx.peek_error().is_none());
    assert!(ctx.get_error().is_none());
    Ok(())
}

#[test]
fn test_destroy_is_idempotent() -> Result<()> {
    let mut ctx = CryptoContext::create(SchemeId::KemKyber, 0, &[])?;
    ctx.keygen()?;
    ctx.destroy();
    ctx.destroy();
    assert_eq!(ctx.state(), ContextState::Destroyed);

    assert!(matches!(ctx.encapsulate(), Err(Error::Destroyed)));
    assert!(matches!(ctx.private_key_encode(), Err(Error::Destroyed)));
    assert_eq!(ctx.errors().len(), 2);
    assert_eq!(ctx.get_error().unwrap().code, ErrorCode::Destroyed);

    // Coding selection is still allowed
    ctx.set_key_coding(KeyCoding::Bac, KeyCoding::Bac);
    assert_eq!(ctx.key_coding(), (KeyCoding::Bac, KeyCoding::Bac));
    Ok(())
}

#[test]
fn test_keygen_replaces_both_keys() -> Result<()> {
    let mut ctx = CryptoContext::create(SchemeId::SigDilithium, 0, &[])?;
    ctx.keygen()?;
    let first = ctx.public_key_encode()?;
    let old_signature = ctx.sign(b"rotate")?;

    ctx.keygen()?;
    assert_ne!(ctx.public_key_encode()?, first);
    assert!(!ctx.verify(b"rotate", &old_signature)?);
    assert_eq!(ctx.statistics().keygens, 2);
    Ok(())
}

#[test]
fn test_processing_stats_summary() -> Result<()> {
    let mut ctx = CryptoContext::create(SchemeId::SigDilithium, 0, &[])?;
    ctx.keygen()?;
    ctx.set_key_coding(KeyCoding::HuffmanStatic, KeyCoding::None);
    ctx.public_key_encode()?;

    let summary = ctx.processing_stats();
    assert!(summary.contains("Dilithium2"));
    assert!(summary.contains("Key generation:     1"));
    assert!(ctx.statistics().coding_ratio(KeyClass::Public).is_some());
    Ok(())
}

#[test]
fn test_context_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<CryptoContext>();
}
