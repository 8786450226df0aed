//! Proptest generators for property-based testing.

use proptest::prelude::*;

use rxproof_core::{CallerId, Digest, DigestAlgorithm, Keypair, Submission};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate an arbitrary digest value.
pub fn digest() -> impl Strategy<Value = Digest> {
    any::<[u8; 32]>().prop_map(Digest::from_bytes)
}

/// Generate a caller id belonging to a real keypair.
pub fn caller_id() -> impl Strategy<Value = CallerId> {
    keypair().prop_map(|kp| kp.caller_id())
}

/// Generate either supported algorithm.
pub fn algorithm() -> impl Strategy<Value = DigestAlgorithm> {
    prop_oneof![Just(DigestAlgorithm::Sha256), Just(DigestAlgorithm::Blake3)]
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=i64::MAX / 2
}

/// Generate file contents of at most `max_len` bytes.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Parameters for generating a submission.
#[derive(Debug, Clone)]
pub struct SubmissionParams {
    pub keypair: Keypair,
    pub payload: Vec<u8>,
    pub algorithm: DigestAlgorithm,
    pub submitted_at: i64,
}

impl Arbitrary for SubmissionParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (any::<[u8; 32]>(), payload(1000), algorithm(), timestamp())
            .prop_map(|(seed, payload, algorithm, submitted_at)| SubmissionParams {
                keypair: Keypair::from_seed(&seed),
                payload,
                algorithm,
                submitted_at,
            })
            .boxed()
    }
}

/// Hash the payload and sign a submission for it.
pub fn submission_from_params(params: &SubmissionParams) -> Submission {
    let digest = Digest::compute(params.algorithm, &params.payload);
    Submission::sign(&params.keypair, digest, params.submitted_at)
}
