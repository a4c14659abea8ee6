use criterion::{criterion_group, criterion_main, Criterion};
use html_assets_localizer::{
    local_file_name, rewrite_references, DownloadOutcome, DownloadRecord, FileManager, HtmlParser,
    LocalAsset, ResourceKind, UrlMapping,
};
use std::hint::black_box;
use std::path::PathBuf;
use tempfile::tempdir;

const PAGE: &str = r#"
    <html>
        <head>
            <link rel="stylesheet" href="https://cdn.example.com/bootstrap.min.css">
            <link href='https://cdn.example.com/theme.css' rel='stylesheet'>
            <link rel="stylesheet" href="/local.css">
            <script src="https://cdn.example.com/jquery.min.js"></script>
            <script src='https://cdn.example.com/v2/bundle?ver=3'></script>
            <script src=https://cdn.example.com/utils.js></script>
            <script src="/local.js"></script>
        </head>
        <body>
            <img src="/logo.png" alt="Logo">
            <script src="https://cdn.example.com/jquery.min.js"></script>
        </body>
    </html>
"#;

fn bench_extraction(c: &mut Criterion) {
    let parser = HtmlParser::new(true).unwrap();

    c.bench_function("extract_resources", |b| {
        b.iter(|| {
            let _resources = parser.extract_resources(black_box(PAGE));
        });
    });
}

fn bench_file_names(c: &mut Criterion) {
    let urls = vec![
        ("https://cdn.example.com/jquery.min.js", ResourceKind::Script),
        ("https://cdn.example.com/v2/bundle?ver=3", ResourceKind::Script),
        ("https://cdn.example.com/theme.css", ResourceKind::Stylesheet),
        ("https://fonts.example.com/css?family=Roboto", ResourceKind::Stylesheet),
    ];

    c.bench_function("local_file_names", |b| {
        b.iter(|| {
            for (url, kind) in &urls {
                let _name = local_file_name(black_box(url), *kind);
            }
        });
    });
}

fn bench_rewriting(c: &mut Criterion) {
    let parser = HtmlParser::new(true).unwrap();
    let resources = parser.extract_resources(PAGE);
    let mut mapping = UrlMapping::default();
    for kind in [ResourceKind::Script, ResourceKind::Stylesheet] {
        for reference in resources.unique(kind) {
            let name = local_file_name(&reference.url, kind);
            let asset = LocalAsset::new(kind, &name, PathBuf::from(&name));
            mapping.insert(DownloadRecord::stored(&reference.url, kind, asset, DownloadOutcome::Cached));
        }
    }

    c.bench_function("rewrite_references", |b| {
        b.iter(|| {
            let _rewritten = rewrite_references(black_box(PAGE), &mapping).unwrap();
        });
    });
}

fn bench_file_saving(c: &mut Criterion) {
    let temp_dir = tempdir().unwrap();
    std::fs::create_dir_all(temp_dir.path().join("js")).unwrap();
    let file_manager = FileManager::new(temp_dir.path());
    let path = file_manager.asset_path(ResourceKind::Script, "benchmark.js");
    let content = b"console.log('benchmarking atomic asset writes');";

    c.bench_function("save_asset_atomically", |b| {
        b.iter(|| {
            let _result = file_manager.save_file(&path, black_box(content));
        });
    });
}

criterion_group!(
    benches,
    bench_extraction,
    bench_file_names,
    bench_rewriting,
    bench_file_saving,
);
criterion_main!(benches);
