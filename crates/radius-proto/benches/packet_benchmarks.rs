use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use radius_proto::auth::{
    calculate_response_authenticator, decrypt_user_password, encrypt_user_password,
    generate_request_authenticator, sign_accounting_request,
};
use radius_proto::message_auth::calculate_message_authenticator;
use radius_proto::{AttributeValue, Code, Dictionary, Packet};

const SECRET: &[u8] = b"testing123";

fn create_test_packet(dict: &Dictionary, num_attributes: usize) -> Packet {
    let req_auth = generate_request_authenticator();
    let mut packet = Packet::new(Code::AccessAccept, 1, req_auth);

    packet
        .add_value(dict, "Session-Timeout", &AttributeValue::Integer(3600))
        .expect("Failed to add Session-Timeout");
    packet
        .add_value(dict, "Framed-Protocol", &"PPP".into())
        .expect("Failed to add Framed-Protocol");

    // Add additional attributes to test scaling
    for i in 0..num_attributes {
        packet
            .add_value(dict, "Reply-Message", &format!("attribute_{}", i).into())
            .expect("Failed to add Reply-Message");
    }

    packet
}

fn bench_packet_encode(c: &mut Criterion) {
    let dict = Dictionary::standard();
    let mut group = c.benchmark_group("packet_encode");

    for num_attrs in [0, 5, 10, 20].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_attrs),
            num_attrs,
            |b, &num_attrs| {
                let packet = create_test_packet(&dict, num_attrs);
                b.iter(|| packet.encode().expect("Failed to encode packet"));
            },
        );
    }

    group.finish();
}

fn bench_packet_decode(c: &mut Criterion) {
    let dict = Dictionary::standard();
    let mut group = c.benchmark_group("packet_decode");

    for num_attrs in [0, 5, 10, 20].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_attrs),
            num_attrs,
            |b, &num_attrs| {
                let encoded = create_test_packet(&dict, num_attrs)
                    .encode()
                    .expect("Failed to encode");
                b.iter(|| Packet::decode(black_box(&encoded)).expect("Failed to decode packet"));
            },
        );
    }

    group.finish();
}

fn bench_typed_attributes(c: &mut Criterion) {
    let dict = Dictionary::standard();
    let packet = create_test_packet(&dict, 10);

    c.bench_function("typed_attributes", |b| {
        b.iter(|| black_box(&packet).typed_attributes(&dict))
    });
}

fn bench_password_encryption(c: &mut Criterion) {
    let mut group = c.benchmark_group("password_encryption");

    let passwords = [
        ("short", "run123"),
        ("medium", "testpassword123"),
        ("long", "this_is_a_very_long_password_to_test_performance"),
    ];

    let req_auth = generate_request_authenticator();

    for (name, password) in passwords.iter() {
        group.bench_with_input(BenchmarkId::new("encrypt", name), password, |b, password| {
            b.iter(|| {
                encrypt_user_password(black_box(password.as_bytes()), SECRET, &req_auth)
                    .expect("Failed to encrypt")
            });
        });

        let encrypted = encrypt_user_password(password.as_bytes(), SECRET, &req_auth)
            .expect("Failed to encrypt");
        group.bench_with_input(BenchmarkId::new("decrypt", name), &encrypted, |b, encrypted| {
            b.iter(|| {
                decrypt_user_password(black_box(encrypted), SECRET, &req_auth)
                    .expect("Failed to decrypt")
            });
        });
    }

    group.finish();
}

fn bench_authenticators(c: &mut Criterion) {
    let dict = Dictionary::standard();
    let reply = create_test_packet(&dict, 5).encode().expect("Failed to encode");
    let req_auth = generate_request_authenticator();

    let mut group = c.benchmark_group("authenticators");
    group.bench_function("response", |b| {
        b.iter(|| calculate_response_authenticator(black_box(&reply), &req_auth, SECRET))
    });
    group.bench_function("accounting_request", |b| {
        let mut request = reply.clone();
        request[0] = Code::AccountingRequest.as_u8();
        b.iter(|| sign_accounting_request(black_box(&mut request), SECRET))
    });
    group.bench_function("message_authenticator", |b| {
        b.iter(|| calculate_message_authenticator(black_box(&reply), SECRET))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_packet_encode,
    bench_packet_decode,
    bench_typed_attributes,
    bench_password_encryption,
    bench_authenticators
);
criterion_main!(benches);
