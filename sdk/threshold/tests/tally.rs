use rand::rngs::OsRng;
use umbra_primitives::{DomainHash, Keypair, Point, Scalar, mul_generator, random_scalar};
use umbra_threshold::{
    CommitteeConfig, DecryptionShare, LocalCommitteeMember, ThresholdError, VoteCiphertext, deal,
    elgamal_encrypt, encrypt_ballot, generate_dleq_proof, tally,
    verify_dleq_proof,
};

fn setup_members(n: u32) -> Vec<LocalCommitteeMember> {
    (1..=n).map(LocalCommitteeMember::generate).collect()
}

#[tokio::test]
async fn three_of_five_decrypts_with_verified_shares() {
    let hasher = DomainHash::ready().await.unwrap();
    let mut locals = setup_members(5);
    let transport: Vec<Point> = locals.iter().map(|m| *m.transport_key()).collect();
    let master = random_scalar(&mut OsRng);

    let (committee, deliveries) = deal(
        hasher.clone(),
        CommitteeConfig::new(3, 5),
        &master,
        &transport,
        &mut OsRng,
    )
    .unwrap();
    for (local, delivery) in locals.iter_mut().zip(&deliveries) {
        local.receive_share(delivery).unwrap();
        assert_eq!(
            Some(local.public_share().unwrap()),
            committee.member(local.index).map(|m| m.public_share)
        );
    }

    let ct = elgamal_encrypt(
        &Scalar::from(42u64),
        &committee.public_key,
        &random_scalar(&mut OsRng),
    );

    // Members 2, 4 and 5 answer
    let shares: Vec<DecryptionShare> = [1usize, 3, 4]
        .iter()
        .map(|&i| locals[i].decryption_share(&hasher, &ct).unwrap())
        .collect();
    for share in &shares {
        assert!(committee.verify_share(&ct, share).unwrap());
    }

    let plaintext = committee.combine(&ct, &shares).unwrap();
    assert_eq!(plaintext, mul_generator(&Scalar::from(42u64)));
}

#[tokio::test]
async fn two_shares_are_not_enough() {
    let hasher = DomainHash::ready().await.unwrap();
    let mut locals = setup_members(5);
    let transport: Vec<Point> = locals.iter().map(|m| *m.transport_key()).collect();
    let (committee, deliveries) = deal(
        hasher.clone(),
        CommitteeConfig::new(3, 5),
        &Scalar::from(99u64),
        &transport,
        &mut OsRng,
    )
    .unwrap();
    for (local, delivery) in locals.iter_mut().zip(&deliveries) {
        local.receive_share(delivery).unwrap();
    }

    let ct = elgamal_encrypt(&Scalar::from(1u64), &committee.public_key, &Scalar::from(5u64));
    let shares: Vec<_> = locals[..2]
        .iter()
        .map(|m| m.decryption_share(&hasher, &ct).unwrap())
        .collect();

    assert!(!committee.can_decrypt(&shares));
    assert_eq!(
        committee.combine(&ct, &shares),
        Err(ThresholdError::InsufficientShares { got: 2, need: 3 })
    );
}

#[tokio::test]
async fn committee_rejects_forged_share() {
    let hasher = DomainHash::ready().await.unwrap();
    let mut locals = setup_members(3);
    let transport: Vec<Point> = locals.iter().map(|m| *m.transport_key()).collect();
    let (committee, deliveries) = deal(
        hasher.clone(),
        CommitteeConfig::new(2, 3),
        &Scalar::from(1234u64),
        &transport,
        &mut OsRng,
    )
    .unwrap();
    for (local, delivery) in locals.iter_mut().zip(&deliveries) {
        local.receive_share(delivery).unwrap();
    }

    let ct = elgamal_encrypt(&Scalar::from(3u64), &committee.public_key, &Scalar::from(8u64));
    let honest = locals[0].decryption_share(&hasher, &ct).unwrap();

    // Member 2 publishes a share under a secret other than its own, with a
    // proof that is valid for that other secret
    let rogue = Scalar::from(777u64);
    let forged = DecryptionShare {
        index: 2,
        share: ct.c1.mul(&rogue),
        proof: generate_dleq_proof(&hasher, &rogue, &ct.c1, &mut OsRng).unwrap(),
    };

    assert!(!committee.verify_share(&ct, &forged).unwrap());
    assert_eq!(
        committee.combine(&ct, &[honest, forged]),
        Err(ThresholdError::InvalidShareProof(2))
    );

    let stranger = DecryptionShare { index: 9, ..honest };
    assert_eq!(
        committee.combine(&ct, &[honest, stranger]),
        Err(ThresholdError::InvalidIndex(9))
    );
}

#[tokio::test]
async fn dleq_proof_binds_share_and_pubkey() {
    let hasher = DomainHash::ready().await.unwrap();
    let secret = random_scalar(&mut OsRng);
    let pubkey = mul_generator(&secret);
    let c1 = mul_generator(&random_scalar(&mut OsRng));
    let share = c1.mul(&secret);

    let proof = generate_dleq_proof(&hasher, &secret, &c1, &mut OsRng).unwrap();
    assert!(verify_dleq_proof(&hasher, &pubkey, &c1, &share, &proof).unwrap());

    let other = Point::generator();
    assert!(!verify_dleq_proof(&hasher, &pubkey, &c1, &share.add(&other), &proof).unwrap());
    assert!(!verify_dleq_proof(&hasher, &pubkey.add(&other), &c1, &share, &proof).unwrap());
    assert!(!verify_dleq_proof(&hasher, &pubkey, &c1.add(&other), &share, &proof).unwrap());
}

#[tokio::test]
async fn ballots_tally_under_threshold_key() {
    let hasher = DomainHash::ready().await.unwrap();
    let mut locals = setup_members(4);
    let transport: Vec<Point> = locals.iter().map(|m| *m.transport_key()).collect();
    let (committee, deliveries) = deal(
        hasher.clone(),
        CommitteeConfig::new(3, 4),
        &random_scalar(&mut OsRng),
        &transport,
        &mut OsRng,
    )
    .unwrap();
    for (local, delivery) in locals.iter_mut().zip(&deliveries) {
        local.receive_share(delivery).unwrap();
    }

    let choices = [0usize, 2, 2, 1, 2, 0, 2];
    let ballots: Vec<Vec<VoteCiphertext>> = choices
        .iter()
        .map(|&c| encrypt_ballot(c, 3, &committee.public_key, &mut OsRng).unwrap())
        .collect();
    let totals = tally(&ballots).unwrap();

    let mut lifted = Vec::new();
    for total in &totals {
        let shares: Vec<_> = locals[1..]
            .iter()
            .map(|m| m.decryption_share(&hasher, total).unwrap())
            .collect();
        let point = committee.combine(total, &shares).unwrap();
        lifted.push(point);
    }
    let expected: Vec<Point> = [2u64, 1, 4]
        .iter()
        .map(|&count| mul_generator(&Scalar::from(count)))
        .collect();
    assert_eq!(lifted, expected);
}

#[test]
fn transport_key_restored_from_bytes_opens_share() {
    let transport = Keypair::new_random();
    let restored = Keypair::from_secret_bytes(&transport.secret_bytes()).unwrap();

    let share = umbra_threshold::SecretShare::new(3, Scalar::from(5u64));
    let sealed =
        umbra_threshold::EncryptedShare::encrypt(&share, transport.public(), &mut OsRng).unwrap();

    let member = LocalCommitteeMember::from_share(
        umbra_threshold::SecretShare::new(3, Scalar::from(0u64)),
        restored,
    );
    assert_eq!(member.decrypt_share(&sealed).unwrap(), share);
}
