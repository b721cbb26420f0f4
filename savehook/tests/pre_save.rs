mod common;

use common::{
    AdminContext, Customer, DiscountedProduct, Product, ReportingContext, ShopContext,
    TrackingProxy, registry, shop,
};
use savehook::{
    Entity, EntityDescriptor, EntityId, EntityState, HookMetadata, HookPhase, HookedEntity,
    RegistryBuilder, SaveHookDispatcher, TypeKey,
    testing::{Behavior, CallLog, RecordingHook},
};
use std::any::Any;

struct Audit;
struct Pricing;
struct Search;

#[test]
fn same_row_is_dispatched_once() {
    let audit = RecordingHook::<Audit>::new();
    let mut dispatcher =
        SaveHookDispatcher::new(registry(RegistryBuilder::new().register(audit.clone())));

    let (mut a, mut b, mut c) = (
        Product::new(1, "lamp", 10),
        Product::new(1, "lamp", 10),
        Product::new(2, "desk", 90),
    );
    let mut entries = [
        shop(&mut a, EntityState::MODIFIED),
        shop(&mut b, EntityState::MODIFIED),
        shop(&mut c, EntityState::MODIFIED),
    ];
    let outcome = dispatcher.trigger_pre_save_hooks(&mut entries, false);

    assert!(outcome.processed_hooks.contains::<RecordingHook<Audit>>());
    assert_eq!(audit.count(HookPhase::BeforeSave), 2);
    assert_eq!(audit.before_completed(), 1);
}

#[test]
fn same_id_in_another_state_is_not_a_duplicate() {
    let audit = RecordingHook::<Audit>::new();
    let mut dispatcher =
        SaveHookDispatcher::new(registry(RegistryBuilder::new().register(audit.clone())));

    let (mut a, mut b) = (Product::new(1, "lamp", 10), Product::new(1, "lamp", 10));
    let mut entries = [
        shop(&mut a, EntityState::MODIFIED),
        shop(&mut b, EntityState::DELETED),
    ];
    dispatcher.trigger_pre_save_hooks(&mut entries, false);

    assert_eq!(audit.count(HookPhase::BeforeSave), 2);
}

#[test]
fn transient_entities_are_never_deduplicated() {
    let audit = RecordingHook::<Audit>::new();
    let mut dispatcher =
        SaveHookDispatcher::new(registry(RegistryBuilder::new().register(audit.clone())));

    let (mut a, mut b) = (Product::new(0, "new lamp", 10), Product::new(0, "new desk", 90));
    let mut entries = [
        shop(&mut a, EntityState::ADDED),
        shop(&mut b, EntityState::ADDED),
    ];
    dispatcher.trigger_pre_save_hooks(&mut entries, false);

    let calls = audit.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|call| call.entity_id.is_none()));
}

#[test]
fn base_type_hooks_fire_for_derived_entities() {
    let pricing = RecordingHook::<Pricing>::new();
    let search = RecordingHook::<Search>::new();
    let mut dispatcher = SaveHookDispatcher::new(registry(
        RegistryBuilder::new()
            .register_with_meta(pricing.clone(), HookMetadata::new::<()>().for_entity::<Product>())
            .register_with_meta(
                search.clone(),
                HookMetadata::new::<()>().for_entity::<DiscountedProduct>(),
            ),
    ));

    let mut discounted = DiscountedProduct::new(3, "chair", 40, 5);
    let mut plain = Product::new(4, "table", 120);
    let mut entries = [
        shop(&mut discounted, EntityState::ADDED),
        shop(&mut plain, EntityState::ADDED),
    ];
    dispatcher.trigger_pre_save_hooks(&mut entries, false);

    assert_eq!(pricing.count(HookPhase::BeforeSave), 2);
    assert_eq!(search.count(HookPhase::BeforeSave), 1);
    assert_eq!(search.calls()[0].entity_type, DiscountedProduct::type_key());
}

#[test]
fn unrelated_entities_are_not_hooked() {
    let pricing = RecordingHook::<Pricing>::new();
    let mut dispatcher = SaveHookDispatcher::new(registry(
        RegistryBuilder::new()
            .register_with_meta(pricing.clone(), HookMetadata::new::<()>().for_entity::<Product>()),
    ));

    let mut customer = Customer::new(1, "Ada");
    let mut entries = [shop(&mut customer, EntityState::ADDED)];
    let outcome = dispatcher.trigger_pre_save_hooks(&mut entries, false);

    assert!(outcome.processed_hooks.is_empty());
    assert!(pricing.calls().is_empty());
}

#[test]
fn context_scoping_follows_context_hierarchy() {
    let shop_hook = RecordingHook::<ShopContext>::new();
    let admin_hook = RecordingHook::<AdminContext>::new();
    let mut dispatcher = SaveHookDispatcher::new(registry(
        RegistryBuilder::new()
            .register_with_meta(
                shop_hook.clone(),
                HookMetadata::new::<()>().for_context::<ShopContext>(),
            )
            .register_with_meta(
                admin_hook.clone(),
                HookMetadata::new::<()>().for_context::<AdminContext>(),
            ),
    ));

    let (mut a, mut b, mut c) = (
        Product::new(1, "lamp", 10),
        Product::new(2, "desk", 90),
        Product::new(3, "chair", 40),
    );
    let mut entries = [
        HookedEntity::in_context::<ShopContext>(&mut a, EntityState::ADDED).unwrap(),
        HookedEntity::in_context::<AdminContext>(&mut b, EntityState::ADDED).unwrap(),
        HookedEntity::in_context::<ReportingContext>(&mut c, EntityState::ADDED).unwrap(),
    ];
    dispatcher.trigger_pre_save_hooks(&mut entries, false);

    assert_eq!(shop_hook.count(HookPhase::BeforeSave), 2);
    assert_eq!(admin_hook.count(HookPhase::BeforeSave), 1);
}

#[test]
fn proxies_resolve_against_the_real_type() {
    let search = RecordingHook::<Search>::new();
    let mut dispatcher = SaveHookDispatcher::new(registry(
        RegistryBuilder::new().register_with_meta(
            search.clone(),
            HookMetadata::new::<()>().for_entity::<DiscountedProduct>(),
        ),
    ));

    let mut proxy = TrackingProxy {
        inner: DiscountedProduct::new(8, "sofa", 300, 30),
    };
    let mut entries = [shop(&mut proxy, EntityState::MODIFIED)];
    dispatcher.trigger_pre_save_hooks(&mut entries, false);

    assert_eq!(search.count(HookPhase::BeforeSave), 1);
    assert_eq!(entries[0].entity_as::<Product>().map(|p| p.price), Some(300));
}

#[test]
fn state_change_becomes_the_new_baseline() {
    let log = CallLog::new();
    let redirect = RecordingHook::<Audit>::new()
        .before(Behavior::Redirect(EntityState::MODIFIED))
        .logging_to(&log, "redirect");
    let observer = RecordingHook::<Search>::new().logging_to(&log, "observer");
    let mut dispatcher = SaveHookDispatcher::new(registry(
        RegistryBuilder::new()
            .register_with_meta(redirect.clone(), HookMetadata::new::<()>().with_order(-10))
            .register(observer.clone()),
    ));

    let mut customer = Customer::new(5, "Ada");
    let mut entries = [shop(&mut customer, EntityState::DELETED)];
    let outcome = dispatcher.trigger_pre_save_hooks(&mut entries, false);

    assert!(outcome.any_state_changed);
    assert_eq!(redirect.states(HookPhase::BeforeSave), [EntityState::DELETED]);
    assert_eq!(observer.states(HookPhase::BeforeSave), [EntityState::MODIFIED]);
    assert_eq!(entries[0].initial_state(), EntityState::MODIFIED);
    assert!(!entries[0].has_state_changed());

    dispatcher.trigger_post_save_hooks(&entries, false);
    assert_eq!(observer.states(HookPhase::AfterSave), [EntityState::MODIFIED]);
    assert_eq!(
        log.entries()[..2],
        ["redirect:before-save".to_owned(), "observer:before-save".to_owned()]
    );
}

#[test]
fn unchanged_state_reports_no_change() {
    let audit = RecordingHook::<Audit>::new();
    let mut dispatcher = SaveHookDispatcher::new(registry(RegistryBuilder::new().register(audit)));

    let mut product = Product::new(1, "lamp", 10);
    let mut entries = [shop(&mut product, EntityState::ADDED)];
    let outcome = dispatcher.trigger_pre_save_hooks(&mut entries, false);

    assert!(!outcome.any_state_changed);
    assert_eq!(outcome.processed_hooks.len(), 1);
}

#[test]
fn faults_do_not_stop_the_batch() {
    let failing = RecordingHook::<Audit>::new().before(Behavior::Fail("tax service down"));
    let panicking = RecordingHook::<Pricing>::new().before(Behavior::Panic("bad price"));
    let healthy = RecordingHook::<Search>::new();
    let mut dispatcher = SaveHookDispatcher::new(registry(
        RegistryBuilder::new()
            .register(failing.clone())
            .register(panicking.clone())
            .register(healthy.clone()),
    ));

    let (mut a, mut b) = (Product::new(1, "lamp", 10), Product::new(2, "desk", 90));
    let mut entries = [
        shop(&mut a, EntityState::ADDED),
        shop(&mut b, EntityState::ADDED),
    ];
    let outcome = dispatcher.trigger_pre_save_hooks(&mut entries, false);

    // Faulting hooks are retried for every entry and never memoized.
    assert_eq!(failing.count(HookPhase::BeforeSave), 2);
    assert_eq!(panicking.count(HookPhase::BeforeSave), 2);
    assert_eq!(healthy.count(HookPhase::BeforeSave), 2);

    assert_eq!(outcome.processed_hooks.len(), 1);
    assert!(outcome.processed_hooks.contains::<RecordingHook<Search>>());
    assert_eq!(failing.before_completed(), 0);
    assert!(dispatcher.registry().void_hooks().is_empty());
}

#[test]
fn completion_runs_once_per_batch() {
    let audit = RecordingHook::<Audit>::new();
    let mut dispatcher =
        SaveHookDispatcher::new(registry(RegistryBuilder::new().register(audit.clone())));

    let mut products: Vec<_> = (1..=5).map(|id| Product::new(id, "item", 1)).collect();
    let mut entries: Vec<_> = products
        .iter_mut()
        .map(|product| shop(product, EntityState::ADDED))
        .collect();
    dispatcher.trigger_pre_save_hooks(&mut entries, false);

    assert_eq!(audit.count(HookPhase::BeforeSave), 5);
    assert_eq!(audit.before_completed(), 1);
    assert_eq!(audit.after_completed(), 0);
}

#[test]
fn completions_run_after_all_entries() {
    let log = CallLog::new();
    let audit = RecordingHook::<Audit>::new().logging_to(&log, "audit");
    let mut dispatcher = SaveHookDispatcher::new(registry(RegistryBuilder::new().register(audit)));

    let (mut a, mut b) = (Product::new(1, "lamp", 10), Product::new(2, "desk", 90));
    let mut entries = [
        shop(&mut a, EntityState::ADDED),
        shop(&mut b, EntityState::ADDED),
    ];
    dispatcher.trigger_pre_save_hooks(&mut entries, false);

    assert_eq!(
        log.entries(),
        [
            "audit:before-save",
            "audit:before-save",
            "audit:before-save completion"
        ]
    );
}

#[test]
fn hooks_run_in_registration_order() {
    let log = CallLog::new();
    let mut dispatcher = SaveHookDispatcher::new(registry(
        RegistryBuilder::new()
            .register_with_meta(
                RecordingHook::<Audit>::new().logging_to(&log, "audit"),
                HookMetadata::new::<()>().with_order(10),
            )
            .register(RecordingHook::<Search>::new().logging_to(&log, "search"))
            .register_with_meta(
                RecordingHook::<Pricing>::new().logging_to(&log, "pricing"),
                HookMetadata::new::<()>().with_order(-1),
            ),
    ));

    let mut product = Product::new(1, "lamp", 10);
    let mut entries = [shop(&mut product, EntityState::MODIFIED)];
    dispatcher.trigger_pre_save_hooks(&mut entries, false);

    assert_eq!(
        log.entries()[..3],
        [
            "pricing:before-save".to_owned(),
            "search:before-save".to_owned(),
            "audit:before-save".to_owned(),
        ]
    );
}

/// A context with no declared place in the context hierarchy.
struct ImportJob;

/// An entity reporting a bare type key.
struct LegacyRow(u64);

impl Entity for LegacyRow {
    fn entity_type(&self) -> TypeKey {
        TypeKey::of::<Self>()
    }

    fn id(&self) -> Option<EntityId> {
        Some(EntityId::new(self.0))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[test]
fn catch_all_hooks_see_undeclared_types() {
    let audit = RecordingHook::<Audit>::new();
    let scoped = RecordingHook::<Search>::new();
    let mut dispatcher = SaveHookDispatcher::new(registry(
        RegistryBuilder::new()
            .register(audit.clone())
            .register_with_meta(
                scoped.clone(),
                HookMetadata::new::<()>().for_context::<ShopContext>(),
            ),
    ));

    let mut product = Product::new(1, "lamp", 10);
    let mut row = LegacyRow(2);
    let mut entries = [
        HookedEntity::new(TypeKey::of::<ImportJob>(), &mut product, EntityState::ADDED).unwrap(),
        shop(&mut row, EntityState::MODIFIED),
    ];
    dispatcher.trigger_pre_save_hooks(&mut entries, false);

    assert_eq!(audit.count(HookPhase::BeforeSave), 2);
    assert_eq!(scoped.count(HookPhase::BeforeSave), 1);
    assert_eq!(scoped.calls()[0].entity_type, TypeKey::of::<LegacyRow>());
}
