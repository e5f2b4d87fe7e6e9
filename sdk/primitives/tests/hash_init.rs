use std::sync::Arc;

use umbra_primitives::{CryptoError, DomainHash, DomainTag, FieldElement};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_initialization_coalesces() {
    let hasher = Arc::new(DomainHash::new());

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let hasher = hasher.clone();
            tokio::spawn(async move { hasher.initialize().await })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert!(hasher.is_initialized());
    let h = hasher
        .hash_tagged(DomainTag::Commitment, &[FieldElement::from(1u64)])
        .unwrap();

    // A second, independently initialized handle computes the same function
    let other = DomainHash::ready().await.unwrap();
    assert_eq!(
        other
            .hash_tagged(DomainTag::Commitment, &[FieldElement::from(1u64)])
            .unwrap(),
        h
    );
}

#[tokio::test]
async fn hash_fails_until_initialized() {
    let hasher = DomainHash::new();
    let input = [FieldElement::from(5u64)];

    assert_eq!(
        hasher.hash_tagged(DomainTag::NullifierKey, &input),
        Err(CryptoError::NotInitialized)
    );

    hasher.initialize().await.unwrap();
    assert!(hasher.hash_tagged(DomainTag::NullifierKey, &input).is_ok());

    // Repeated initialization is a no-op
    hasher.initialize().await.unwrap();
}

#[tokio::test]
async fn global_handle_is_shared() {
    let a = DomainHash::global();
    let b = DomainHash::global();
    assert!(Arc::ptr_eq(&a, &b));

    a.initialize().await.unwrap();
    assert!(b.is_initialized());
}

#[tokio::test]
async fn long_inputs_hash_deterministically() {
    let hasher = DomainHash::ready().await.unwrap();
    let inputs: Vec<FieldElement> = (0..13u64).map(FieldElement::from).collect();

    let h1 = hasher.hash(None, &inputs).unwrap();
    let h2 = hasher.hash(None, &inputs).unwrap();
    assert_eq!(h1, h2);

    let h3 = hasher.hash(None, &inputs[..12]).unwrap();
    assert_ne!(h1, h3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn blocking_init_joins_async_generation() {
    let hasher = Arc::new(DomainHash::new());
    let input = [FieldElement::from(9u64)];

    let async_init = {
        let hasher = hasher.clone();
        tokio::spawn(async move { hasher.initialize().await })
    };
    let blocking: Vec<_> = (0..4)
        .map(|_| {
            let hasher = hasher.clone();
            std::thread::spawn(move || {
                hasher.initialize_blocking();
                // Usable as soon as the blocking call returns
                hasher.hash_tagged(DomainTag::SpendNullifier, &input)
            })
        })
        .collect();

    let mut outputs = Vec::new();
    for handle in blocking {
        outputs.push(handle.join().unwrap().unwrap());
    }
    async_init.await.unwrap().unwrap();

    assert!(outputs.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(hasher.hash_tagged(DomainTag::SpendNullifier, &input).unwrap(), outputs[0]);
}
