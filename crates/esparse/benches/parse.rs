//! Tokenizer and parser benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use esparse::{parse, tokenizer, Options};

const SAMPLE_SOURCE: &str = r#"
// Sample JavaScript code for benchmarking
function fibonacci(n) {
    if (n <= 1) return n;
    return fibonacci(n - 1) + fibonacci(n - 2);
}

class Calculator {
    constructor() {
        this.result = 0;
    }

    add(x, y) {
        return x + y;
    }

    multiply(x, y) {
        return x * y;
    }

    async fetchData(url) {
        const response = await fetch(url);
        return response.json();
    }
}

const calc = new Calculator();
const numbers = [1, 2, 3, 4, 5].map(n => n * 2);
const { a, b, ...rest } = { a: 1, b: 2, c: 3, d: 4 };
const template = `Hello ${name}, you have ${count} messages`;
const pattern = /^(?<user>[a-z]+)@example\.com$/iu;

export { Calculator, fibonacci };
export default calc;
"#;

fn bench_tokenizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenizer");
    group.throughput(Throughput::Bytes(SAMPLE_SOURCE.len() as u64));

    group.bench_function("sample", |b| {
        b.iter(|| {
            let options = Options::default().module();
            for token in tokenizer(black_box(SAMPLE_SOURCE), options) {
                black_box(token.unwrap());
            }
        });
    });

    group.finish();
}

fn bench_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser");
    group.throughput(Throughput::Bytes(SAMPLE_SOURCE.len() as u64));

    group.bench_function("sample", |b| {
        b.iter(|| parse(black_box(SAMPLE_SOURCE), Options::default().module()).unwrap());
    });

    group.bench_function("sample_with_locations", |b| {
        let options = Options::default().module().with_locations(true).with_ranges(true);
        b.iter(|| parse(black_box(SAMPLE_SOURCE), options.clone()).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_tokenizer, bench_parser);
criterion_main!(benches);
