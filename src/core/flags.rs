/*!
Feature flag resolution.

A context is configured by up to three 32-bit flag words. Word 0 selects
entropy coding, Gaussian sampling, hashing, reduction and threading;
word 1 selects the CSPRNG; word 2 holds side-channel countermeasures.
A word announces its successor with the `FLAG_MORE` bit.

`resolve` decodes the words once into a typed `FeatureConfig`. Nothing
downstream looks at the raw bits again.
*/

use std::fmt;

use crate::core::coding::KeyCoding;
use crate::core::constants::{FLAG_MORE, FLAG_WORDS, word0, word2};
use crate::core::crypto::hash::{DigestLength, HashAlgorithm, HashFamily};
use crate::core::csprng::{self, CsprngRequest};
use crate::core::error::FlagError;

/// Entropy coders requested in word 0 (independent bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntropyCoders {
    pub bac: bool,
    pub bac_rle: bool,
    pub strongswan: bool,
    pub huffman_static: bool,
}

impl EntropyCoders {
    /// The coder applied to signatures: BAC > BAC+RLE > interoperable Huffman > static Huffman
    pub fn primary(&self) -> KeyCoding {
        if self.bac {
            KeyCoding::Bac
        } else if self.bac_rle {
            KeyCoding::BacRle
        } else if self.strongswan {
            KeyCoding::StrongSwan
        } else if self.huffman_static {
            KeyCoding::HuffmanStatic
        } else {
            KeyCoding::None
        }
    }
}

/// Precision of Gaussian samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplePrecision {
    #[default]
    Default,
    Bits32,
    Bits64,
    Bits128,
    Bits192,
    Bits256,
}

/// Gaussian sampler families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GaussianSampler {
    Cdf,
    KnuthYao,
    Ziggurat,
    Bac,
    Huffman,
    Bernoulli,
}

impl GaussianSampler {
    pub fn name(&self) -> &'static str {
        match self {
            GaussianSampler::Cdf => "CDF",
            GaussianSampler::KnuthYao => "Knuth-Yao",
            GaussianSampler::Ziggurat => "Ziggurat",
            GaussianSampler::Bac => "BAC",
            GaussianSampler::Huffman => "Huffman",
            GaussianSampler::Bernoulli => "Bernoulli",
        }
    }
}

// Highest priority first
const SAMPLER_PRIORITY: [(u32, GaussianSampler); 6] = [
    (word0::SAMPLE_CDF, GaussianSampler::Cdf),
    (word0::SAMPLE_KNUTH_YAO, GaussianSampler::KnuthYao),
    (word0::SAMPLE_ZIGGURAT, GaussianSampler::Ziggurat),
    (word0::SAMPLE_BAC, GaussianSampler::Bac),
    (word0::SAMPLE_HUFFMAN, GaussianSampler::Huffman),
    (word0::SAMPLE_BERNOULLI, GaussianSampler::Bernoulli),
];

/// Modular reduction strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReductionStrategy {
    Reference,
    Barrett,
    FloatingPoint,
}

impl ReductionStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ReductionStrategy::Reference => "reference",
            ReductionStrategy::Barrett => "Barrett",
            ReductionStrategy::FloatingPoint => "floating-point",
        }
    }
}

/// Hash family and digest length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HashSelection {
    pub family: HashFamily,
    pub length: DigestLength,
}

impl HashSelection {
    /// The concrete algorithm, falling back to the scheme's own digest
    pub fn algorithm(&self, scheme_default: HashAlgorithm) -> HashAlgorithm {
        HashAlgorithm::from_family(self.family, self.length).unwrap_or(scheme_default)
    }
}

/// Operation classes that may run their internals on worker threads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThreadingFlags {
    pub keygen: bool,
    pub encrypt_sign: bool,
    pub decrypt_verify: bool,
}

/// Proportion of samples discarded to mask timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscardRate {
    #[default]
    None,
    Low,
    Medium,
    High,
}

/// Side-channel countermeasures (word 2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SideChannelConfig {
    pub discard: DiscardRate,
    pub cache_access: bool,
    pub non_ct_mask: bool,
    pub shuffle: bool,
    pub blinding: bool,
}

/// Resolved, immutable feature configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureConfig {
    pub entropy: EntropyCoders,
    pub sample_precision: SamplePrecision,
    pub sample_blinding: bool,
    /// `None` leaves the choice to the scheme
    pub sampler: Option<GaussianSampler>,
    pub hash: HashSelection,
    /// `None` leaves the choice to the scheme
    pub reduction: Option<ReductionStrategy>,
    pub threading: ThreadingFlags,
    pub csprng: CsprngRequest,
    pub side_channel: SideChannelConfig,
}

impl FeatureConfig {
    /// Coding applied to signatures produced under this configuration
    pub fn signature_coding(&self) -> KeyCoding {
        self.entropy.primary()
    }
}

impl fmt::Display for FeatureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "coding={} sampler={} hash={:?}/{:?} reduction={} csprng={}",
            self.signature_coding(),
            self.sampler.map_or("default", |s| s.name()),
            self.hash.family,
            self.hash.length,
            self.reduction.map_or("default", |r| r.name()),
            self.csprng.algorithm,
        )
    }
}

/// Follow the `FLAG_MORE` chain; absent words are zero
fn chained_words(words: &[u32]) -> Result<[u32; FLAG_WORDS], FlagError> {
    let mut chain = [0u32; FLAG_WORDS];
    let Some(&first) = words.first() else {
        return Ok(chain);
    };
    chain[0] = first;

    let mut index = 0;
    while chain[index] & FLAG_MORE != 0 {
        index += 1;
        if index == FLAG_WORDS {
            return Err(FlagError::ReservedBits {
                word: index - 1,
                bits: FLAG_MORE,
            });
        }
        chain[index] = *words.get(index).ok_or(FlagError::MissingWord(index))?;
    }
    Ok(chain)
}

fn resolve_word0(word: u32) -> Result<FeatureConfig, FlagError> {
    let reserved = word & !word0::DEFINED;
    if reserved != 0 {
        return Err(FlagError::ReservedBits { word: 0, bits: reserved });
    }

    let entropy = EntropyCoders {
        bac: word & word0::ENTROPY_BAC != 0,
        bac_rle: word & word0::ENTROPY_BAC_RLE != 0,
        strongswan: word & word0::ENTROPY_STRONGSWAN != 0,
        huffman_static: word & word0::ENTROPY_HUFFMAN_STATIC != 0,
    };

    let sample_precision =
        match (word & word0::SAMPLE_PRECISION_MASK) >> word0::SAMPLE_PRECISION_SHIFT {
            0 => SamplePrecision::Default,
            1 => SamplePrecision::Bits32,
            2 => SamplePrecision::Bits64,
            3 => SamplePrecision::Bits128,
            4 => SamplePrecision::Bits192,
            5 => SamplePrecision::Bits256,
            _ => return Err(FlagError::InvalidField("sample_precision")),
        };

    let sampler = SAMPLER_PRIORITY
        .iter()
        .find(|(bit, _)| word & bit != 0)
        .map(|&(_, sampler)| sampler);

    let length = match (word & word0::HASH_LENGTH_MASK) >> word0::HASH_LENGTH_SHIFT {
        0 => DigestLength::Bits512,
        1 => DigestLength::Bits384,
        2 => DigestLength::Bits256,
        _ => DigestLength::Bits224,
    };

    let family = match (word & word0::HASH_FUNCTION_MASK) >> word0::HASH_FUNCTION_SHIFT {
        0 => HashFamily::SchemeDefault,
        1 => HashFamily::Blake2,
        2 => HashFamily::Sha2,
        3 => HashFamily::Sha3,
        4 => HashFamily::Whirlpool,
        _ => return Err(FlagError::InvalidField("hash_function")),
    };
    if family == HashFamily::Whirlpool && length != DigestLength::Bits512 {
        return Err(FlagError::Incompatible("hash_length"));
    }

    let reduction = match (word & word0::REDUCTION_MASK) >> word0::REDUCTION_SHIFT {
        0 => None,
        1 => Some(ReductionStrategy::Reference),
        2 => Some(ReductionStrategy::Barrett),
        3 => Some(ReductionStrategy::FloatingPoint),
        _ => return Err(FlagError::InvalidField("reduction")),
    };

    let known_threading =
        word0::THREADING_KEYGEN | word0::THREADING_ENC_SIGN | word0::THREADING_DEC_VERIFY;
    if word & word0::THREADING_MASK & !known_threading != 0 {
        return Err(FlagError::InvalidField("threading"));
    }
    let threading = ThreadingFlags {
        keygen: word & word0::THREADING_KEYGEN != 0,
        encrypt_sign: word & word0::THREADING_ENC_SIGN != 0,
        decrypt_verify: word & word0::THREADING_DEC_VERIFY != 0,
    };

    Ok(FeatureConfig {
        entropy,
        sample_precision,
        sample_blinding: word & word0::SAMPLE_BLINDING != 0,
        sampler,
        hash: HashSelection { family, length },
        reduction,
        threading,
        ..FeatureConfig::default()
    })
}

fn resolve_word2(word: u32) -> Result<SideChannelConfig, FlagError> {
    let reserved = word & !word2::DEFINED;
    if reserved != 0 {
        return Err(FlagError::ReservedBits { word: 2, bits: reserved });
    }

    Ok(SideChannelConfig {
        discard: match word & word2::DISCARD_MASK {
            0 => DiscardRate::None,
            1 => DiscardRate::Low,
            2 => DiscardRate::Medium,
            _ => DiscardRate::High,
        },
        cache_access: word & word2::CACHE_ACCESS != 0,
        non_ct_mask: word & word2::NON_CT_MASK != 0,
        shuffle: word & word2::SHUFFLE != 0,
        blinding: word & word2::BLINDING != 0,
    })
}

/// Decode flag words into a feature configuration.
///
/// An empty slice resolves to all defaults.
pub fn resolve(words: &[u32]) -> Result<FeatureConfig, FlagError> {
    let [w0, w1, w2] = chained_words(words)?;

    let mut config = resolve_word0(w0)?;
    config.csprng = csprng::select(w1)?;
    config.side_channel = resolve_word2(w2)?;
    Ok(config)
}
