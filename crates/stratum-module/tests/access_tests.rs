//! Integration tests for cross-module access checks

use std::sync::Arc;
use std::thread;

use stratum_module::{
    Access, AccessChecker, Configuration, IllegalAccess, Layer, LoaderId, ModuleDescriptor,
    ModuleLibrary, ModuleRef, Resolver, UnnamedModule,
};

/// Boot configuration holding `java.base`
fn boot_configuration() -> Arc<Configuration> {
    let finder = ModuleLibrary::of([ModuleDescriptor::builder("java.base")
        .exports("java.lang")
        .build()
        .unwrap()])
    .unwrap();
    Arc::new(Resolver::new(&finder).resolve(["java.base"]).unwrap())
}

/// Boot layer: `java.base` is owned by the platform, so it has no loader
fn boot_layer() -> Arc<Layer> {
    Arc::new(Layer::create(boot_configuration(), None, |_| None).unwrap())
}

fn application_layer(boot: &Arc<Layer>, m2: ModuleDescriptor) -> Layer {
    let finder = ModuleLibrary::of([
        ModuleDescriptor::builder("m1")
            .requires("java.base")
            .requires("m2")
            .build()
            .unwrap(),
        m2,
    ])
    .unwrap();
    let cf = Resolver::new(&finder)
        .with_parent(boot.configuration().clone())
        .resolve(["m1"])
        .unwrap();

    let loader = LoaderId::new("app");
    Layer::create(Arc::new(cf), Some(boot.clone()), |_| Some(loader.clone())).unwrap()
}

#[test]
fn test_unnamed_module_accesses_unqualified_export() {
    let boot = boot_layer();
    let m2 = ModuleDescriptor::builder("m2")
        .requires("java.base")
        .exports("p2")
        .build()
        .unwrap();
    let layer = application_layer(&boot, m2);

    let cf = layer.configuration();
    assert_eq!(cf.module_names().collect::<Vec<_>>(), vec!["m1", "m2"]);
    assert!(cf.reads("m1", "m2"));

    assert_eq!(layer.find_loader("m1"), Some(&LoaderId::new("app")));
    assert_eq!(layer.find_loader("m2"), Some(&LoaderId::new("app")));
    assert_eq!(layer.find_loader("java.base"), None);

    let unnamed = UnnamedModule::new(Some(LoaderId::new("app")));
    let checker = layer.access_checker();
    assert_eq!(
        checker.check_type(&unnamed.module_ref(), &ModuleRef::named("m2"), "p2.c2"),
        Access::Permitted
    );
}

#[test]
fn test_unnamed_module_denied_concealed_package() {
    let boot = boot_layer();
    let m2 = ModuleDescriptor::builder("m2")
        .requires("java.base")
        .conceals("p2")
        .build()
        .unwrap();
    let layer = application_layer(&boot, m2);

    let unnamed = UnnamedModule::new(Some(LoaderId::new("app")));
    let checker = layer.access_checker();
    let access = checker.check_type(&unnamed.module_ref(), &ModuleRef::named("m2"), "p2.c2");
    assert_eq!(access, Access::DeniedNotExported);

    let error = access
        .into_result(&unnamed.module_ref(), &ModuleRef::named("m2"), "p2")
        .unwrap_err();
    assert!(matches!(error, IllegalAccess::NotExported { .. }));
    assert!(error.to_string().contains("does not export"));
}

#[test]
fn test_unnamed_module_denied_package_exported_to_nobody() {
    let boot = boot_layer();
    let m2 = ModuleDescriptor::builder("m2")
        .requires("java.base")
        .exports("p2")
        .conceals("p6")
        .build()
        .unwrap();
    let layer = application_layer(&boot, m2);
    let checker = layer.access_checker();
    let unnamed = UnnamedModule::new(Some(LoaderId::new("app"))).module_ref();

    // Readability holds for the unnamed module; only the export check fails
    assert_eq!(
        checker.check_type(&unnamed, &ModuleRef::named("m2"), "p6.c6"),
        Access::DeniedNotExported
    );
    assert_eq!(
        checker.check_type(&unnamed, &ModuleRef::named("java.base"), "java.lang.Object"),
        Access::Permitted
    );
}

#[test]
fn test_self_access_invariance() {
    let finder = ModuleLibrary::of([
        ModuleDescriptor::builder("m1")
            .requires("m2")
            .exports("p1")
            .conceals("p1.internal")
            .build()
            .unwrap(),
        ModuleDescriptor::builder("m2")
            .exports_to("p2", ["m9"])
            .conceals("p3")
            .build()
            .unwrap(),
    ])
    .unwrap();
    let checker = AccessChecker::new(Arc::new(Resolver::new(&finder).resolve(["m1"]).unwrap()));

    for descriptor in checker.configuration().modules() {
        let module = ModuleRef::named(descriptor.name());
        for package in descriptor.packages() {
            assert_eq!(
                checker.check(&module, &module, package),
                Access::Permitted,
                "{} accessing its own {}",
                descriptor.name(),
                package
            );
        }
    }
}

#[test]
fn test_unqualified_export_monotonicity() {
    let finder = ModuleLibrary::of([
        ModuleDescriptor::builder("a").requires("b").build().unwrap(),
        ModuleDescriptor::builder("c").requires("a").build().unwrap(),
        ModuleDescriptor::builder("b").exports("pb").build().unwrap(),
    ])
    .unwrap();
    let cf = Resolver::new(&finder).resolve(["c"]).unwrap();
    let checker = AccessChecker::new(Arc::new(cf));
    let b = ModuleRef::named("b");

    let requesters = [
        ModuleRef::named("a"),
        ModuleRef::named("c"),
        UnnamedModule::new(None).module_ref(),
    ];
    for requester in &requesters {
        if let Some(name) = requester.name() {
            assert!(checker.configuration().reads(name, "b"));
        }
        assert_eq!(checker.check(requester, &b, "pb"), Access::Permitted);
    }
}

#[test]
fn test_qualified_export_exactness() {
    let finder = ModuleLibrary::of([
        ModuleDescriptor::builder("x").requires("b").build().unwrap(),
        ModuleDescriptor::builder("y").requires("b").build().unwrap(),
        ModuleDescriptor::builder("b")
            .exports_to("p", ["x"])
            .build()
            .unwrap(),
    ])
    .unwrap();
    let cf = Resolver::new(&finder).resolve(["x", "y"]).unwrap();
    assert!(cf.reads("y", "b"));
    let checker = AccessChecker::new(Arc::new(cf));
    let b = ModuleRef::named("b");

    assert_eq!(checker.check(&ModuleRef::named("x"), &b, "p"), Access::Permitted);
    assert_eq!(
        checker.check(&ModuleRef::named("y"), &b, "p"),
        Access::DeniedNotExported
    );
    assert_eq!(
        checker.check(&UnnamedModule::new(None).module_ref(), &b, "p"),
        Access::DeniedNotExported
    );
}

#[test]
fn test_not_readable_fails_before_exports() {
    let finder = ModuleLibrary::of([
        ModuleDescriptor::builder("a").build().unwrap(),
        ModuleDescriptor::builder("b").conceals("hidden").build().unwrap(),
    ])
    .unwrap();
    let cf = Resolver::new(&finder).resolve(["a", "b"]).unwrap();
    let checker = AccessChecker::new(Arc::new(cf));

    let access = checker.check(&ModuleRef::named("a"), &ModuleRef::named("b"), "hidden");
    assert_eq!(access, Access::DeniedNotReadable);
    assert_eq!(
        access
            .into_result(&ModuleRef::named("a"), &ModuleRef::named("b"), "hidden")
            .unwrap_err()
            .to_string(),
        "module a cannot read module b"
    );
}

#[test]
fn test_access_across_layers() {
    let boot = boot_layer();
    let finder = ModuleLibrary::of([ModuleDescriptor::builder("app")
        .requires("java.base")
        .build()
        .unwrap()])
    .unwrap();
    let cf = Resolver::new(&finder)
        .with_parent(boot.configuration().clone())
        .resolve(["app"])
        .unwrap();
    let layer = Layer::create(Arc::new(cf), Some(boot.clone()), |name| {
        Some(LoaderId::new(name))
    })
    .unwrap();

    let checker = layer.access_checker();
    let java_base = ModuleRef::named("java.base");
    assert_eq!(
        checker.check(&ModuleRef::named("app"), &java_base, "java.lang"),
        Access::Permitted
    );
    // Parents never read their children
    assert_eq!(
        checker.check(&java_base, &ModuleRef::named("app"), "app"),
        Access::DeniedNotReadable
    );
    assert!(layer.find_module("java.base").is_some());
    assert_eq!(layer.modules().collect::<Vec<_>>(), vec!["app"]);
}

#[test]
fn test_concurrent_checks_share_one_configuration() {
    let boot = boot_layer();
    let m2 = ModuleDescriptor::builder("m2")
        .requires("java.base")
        .exports("p2")
        .conceals("p6")
        .build()
        .unwrap();
    let layer = application_layer(&boot, m2);
    let checker = layer.access_checker();
    let unnamed = UnnamedModule::new(None).module_ref();
    let m1 = ModuleRef::named("m1");
    let m2 = ModuleRef::named("m2");

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..100 {
                    assert_eq!(checker.check(&m1, &m2, "p2"), Access::Permitted);
                    assert_eq!(checker.check(&m1, &m2, "p6"), Access::DeniedNotExported);
                    assert_eq!(checker.check(&unnamed, &m2, "p2"), Access::Permitted);
                    assert_eq!(checker.check(&m2, &m1, "p1"), Access::DeniedNotReadable);
                }
            });
        }
    });

    // m1 owns no package `p1`, so that outcome is not memoized
    assert_eq!(checker.cache_len(), 3);
}
