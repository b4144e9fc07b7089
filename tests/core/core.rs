use abstractable::core::config::{load_config, parse_config};
use abstractable::core::manifest::{load_manifest, parse_manifest};
use abstractable::core::report::{Verdict, check_all, render_text};
use abstractable::{AbstractError, CreateOp, GateConfig, Runtime, TypeSpec};
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::tempdir;

const LISTS: &str = r#"
[[types]]
name = "AbstractList"
abstract = ["size", "empty?", "add"]

[[types]]
name = "NotImplList"
extends = "AbstractList"

[[types]]
name = "OneImplList"
extends = "AbstractList"
methods = ["size"]

[[types]]
name = "AllImplList"
extends = "OneImplList"
methods = ["empty?", "add"]
"#;

#[test]
fn concurrent_creation_shares_one_memo() {
    let rt = Arc::new(parse_manifest(LISTS).unwrap().build(GateConfig::default()).unwrap());
    let all = rt.type_id("AllImplList").unwrap();
    let not_impl = rt.type_id("NotImplList").unwrap();

    let workers = 8;
    let barrier = Arc::new(Barrier::new(workers));
    let handles: Vec<_> = (0..workers)
        .map(|i| {
            let rt = Arc::clone(&rt);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..50 {
                    let op = if i % 2 == 0 { CreateOp::New } else { CreateOp::Allocate };
                    rt.create(all, op).expect("AllImplList is complete");
                    assert!(rt.create(not_impl, op).is_err());
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("worker panicked");
    }

    assert!(!rt.required_validate(all).unwrap());
    assert!(rt.required_validate(not_impl).unwrap());
    assert!(rt.memo(not_impl).unwrap().is_none());
}

#[test]
fn concurrent_declarations_on_distinct_classes() {
    let rt = Arc::new(Runtime::default());
    let ids: Vec<_> = (0..6)
        .map(|i| rt.register(TypeSpec::class(format!("Abstract{}", i))).unwrap())
        .collect();

    let handles: Vec<_> = ids
        .iter()
        .copied()
        .map(|ty| {
            let rt = Arc::clone(&rt);
            thread::spawn(move || {
                for n in 0..20 {
                    rt.declare(ty.instance(), &[format!("m{}", n)]).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("worker panicked");
    }

    for ty in ids {
        let names = rt.abstract_methods(ty, false).unwrap();
        assert_eq!(names.len(), 20);
        assert_eq!(names[0].as_str(), "m0");
        assert_eq!(names[19].as_str(), "m19");
    }
}

#[test]
fn removing_an_override_invalidates_the_memo() {
    let rt = parse_manifest(LISTS).unwrap().build(GateConfig::default()).unwrap();
    let all = rt.type_id("AllImplList").unwrap();
    rt.new_instance(all).unwrap();
    let memo = rt.memo(all).unwrap().expect("memo recorded");
    assert_eq!(memo.names.len(), 3);

    assert!(rt.remove_method(all.instance(), "add").unwrap());
    assert!(rt.required_validate(all).unwrap());
    let err = rt.new_instance(all).unwrap_err();
    assert_eq!(
        err.to_string(),
        "following abstract methods are not implemented.\n[add] defined in AbstractList"
    );

    rt.define_method(all.instance(), "add").unwrap();
    rt.new_instance(all).unwrap();
}

#[test]
fn redeclaring_in_a_subclass_does_not_satisfy_the_parent() {
    let rt = parse_manifest(LISTS).unwrap().build(GateConfig::default()).unwrap();
    let list = rt.type_id("AbstractList").unwrap();
    let sized = rt
        .register(TypeSpec::class("AbstractSizedList").extends(list))
        .unwrap();
    rt.declare(sized.instance(), &["size"]).unwrap();
    let leaf = rt
        .register(TypeSpec::class("SizedList").extends(sized))
        .unwrap();
    rt.define_methods(leaf.instance(), &["empty?", "add"]).unwrap();

    let missing = rt.find_missing(leaf).unwrap();
    assert_eq!(missing.owners(), vec![list.instance(), sized.instance()]);

    rt.define_method(leaf.instance(), "size").unwrap();
    rt.new_instance(leaf).unwrap();
}

#[test]
fn manifest_with_modules_and_static_contracts() {
    let manifest = parse_manifest(
        r#"
[[types]]
name = "AbstractAddressHolder"
kind = "module"
abstract = ["city", "state", "zip"]

[[types]]
name = "AbstractApplication"
static_abstract = ["name"]

[[types]]
name = "Application"
extends = "AbstractApplication"
include = ["AbstractAddressHolder"]
methods = ["city", "state", "zip"]
static_methods = ["name"]

[[types]]
name = "Prefixed"
prepend = ["AbstractAddressHolder"]
methods = ["city"]
"#,
    )
    .unwrap();
    let rt = manifest.build(GateConfig::default()).unwrap();
    let app = rt.type_id("Application").unwrap();
    rt.new_instance(app).unwrap();
    assert!(rt.find_missing_static(app).unwrap().is_empty());

    // A prepended module has no descendants in the chain, so it constrains
    // nothing at creation; its skeletons still shadow the class's bodies.
    let prefixed = rt.type_id("Prefixed").unwrap();
    let holder = rt.type_id("AbstractAddressHolder").unwrap();
    assert!(rt.find_missing(prefixed).unwrap().is_empty());
    let inst = rt.new_instance(prefixed).unwrap();
    assert_eq!(
        rt.call(&inst, "city").unwrap_err().to_string(),
        "city is abstract method defined in AbstractAddressHolder, and must implement."
    );
    assert_eq!(rt.ancestors(prefixed.instance()).unwrap()[0], holder.instance());
}

#[test]
fn manifest_forward_reference_is_rejected() {
    let manifest = parse_manifest(
        r#"
[[types]]
name = "Leaf"
extends = "Base"

[[types]]
name = "Base"
"#,
    )
    .unwrap();
    let err = manifest.build(GateConfig::default()).err().unwrap();
    assert!(matches!(err, AbstractError::InvalidArgument(_)));
    assert!(err.to_string().contains("Base"));
}

#[test]
fn manifest_and_config_load_from_disk() {
    let dir = tempdir().unwrap();
    let manifest_path = dir.path().join("lists.toml");
    fs::write(&manifest_path, LISTS).unwrap();
    let config_path = dir.path().join("abstractable.toml");
    fs::write(&config_path, "[gate]\nignore_validation = true\n").unwrap();

    let config = load_config(&config_path).unwrap();
    assert!(config.ignore_validation);
    assert_eq!(
        load_config(&dir.path().join("missing.toml")).unwrap(),
        GateConfig::default()
    );
    assert!(parse_config("[gate]\nignore_validation = \"yes\"\n").is_err());

    let rt = load_manifest(&manifest_path).unwrap().build(config).unwrap();
    let not_impl = rt.type_id("NotImplList").unwrap();
    rt.new_instance(not_impl).expect("validation bypassed");
}

#[test]
fn check_report_classifies_every_type() {
    let rt = parse_manifest(LISTS).unwrap().build(GateConfig::default()).unwrap();
    rt.register(TypeSpec::module("Enumerable")).unwrap();
    let report = check_all(&rt).unwrap();

    let verdicts: Vec<_> = report
        .types
        .iter()
        .map(|t| (t.name.as_str(), &t.verdict))
        .collect();
    assert!(matches!(verdicts[0], ("AbstractList", Verdict::Abstract { .. })));
    assert!(matches!(verdicts[1], ("NotImplList", Verdict::NotImplemented { .. })));
    assert!(matches!(verdicts[2], ("OneImplList", Verdict::NotImplemented { .. })));
    assert!(matches!(verdicts[3], ("AllImplList", Verdict::Instantiable)));
    assert!(matches!(verdicts[4], ("Enumerable", Verdict::Skipped)));

    assert_eq!(report.instantiable, 1);
    assert_eq!(report.abstract_types, 1);
    assert_eq!(report.failures, 2);
    assert!(!report.passed());

    let text = render_text(&report);
    assert!(text.contains("[empty?, add] defined in AbstractList"));
    assert!(text.contains("1 instantiable, 1 abstract, 2 failing"));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["types"][1]["status"], "not_implemented");
    assert_eq!(json["types"][1]["missing"][0]["owner"], "AbstractList");
    assert_eq!(json["types"][4]["kind"], "module");
}

#[test]
fn check_passes_when_only_abstract_layers_are_incomplete() {
    let manifest = parse_manifest(
        r#"
[[types]]
name = "AbstractCollection"
abstract = ["add", "remove"]

[[types]]
name = "AbstractQueue"
extends = "AbstractCollection"
abstract = ["clear"]

[[types]]
name = "PriorityQueue"
extends = "AbstractQueue"
methods = ["add", "remove", "clear"]
"#,
    )
    .unwrap();
    let rt = manifest.build(GateConfig::default()).unwrap();
    let report = check_all(&rt).unwrap();

    assert!(matches!(report.types[0].verdict, Verdict::Abstract { .. }));
    assert!(matches!(report.types[1].verdict, Verdict::Abstract { .. }));
    assert!(matches!(report.types[2].verdict, Verdict::Instantiable));
    assert_eq!(report.failures, 0);
    assert!(report.passed());

    // Creating the intermediate class directly still reports its ancestors first.
    let queue = rt.type_id("AbstractQueue").unwrap();
    assert!(rt.new_instance(queue).unwrap_err().missing().is_some());
}
