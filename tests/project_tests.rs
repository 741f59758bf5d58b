//! Project and library model behavior: loading, lazy adds, membership
//! invariants, package paths.

mod helpers;

use helpers::{position_in, test_library, write_file};
use mols::project::{AddOutcome, ProjectError};
use rstest::rstest;

#[test]
fn load_library_walks_all_mo_files() {
    let fixture = test_library();
    let library = fixture.project.library_by_name("TestLibrary").unwrap();
    assert_eq!(library.name(), "TestLibrary");
    assert!(!library.is_workspace());
    assert_eq!(library.document_count(), 9);
    // every document lies under the library root with the library name as
    // the head of its package path
    for id in library.document_ids() {
        let document = fixture.project.document(id).unwrap();
        assert!(document.path().starts_with(library.root()));
        assert_eq!(document.package_path()[0], "TestLibrary");
    }
}

#[rstest]
#[case("package.mo", &["TestLibrary"])]
#[case("Constants.mo", &["TestLibrary", "Constants"])]
#[case("TestPackage/TestClass.mo", &["TestLibrary", "TestPackage", "TestClass"])]
fn package_paths_follow_the_filesystem(#[case] relative: &str, #[case] expected: &[&str]) {
    let fixture = test_library();
    let document = fixture
        .project
        .get_document(&fixture.file(relative))
        .unwrap_or_else(|| panic!("{relative} is loaded"));
    assert_eq!(document.package_path(), expected, "{relative}");
}

#[test]
fn within_path_drops_the_files_own_class() {
    let fixture = test_library();
    let constants = fixture
        .project
        .get_document(&fixture.file("Constants.mo"))
        .unwrap();
    assert_eq!(constants.within_path(), ["TestLibrary"]);
    let root = fixture
        .project
        .get_document(&fixture.file("package.mo"))
        .unwrap();
    assert!(root.within_path().is_empty());
}

#[test]
fn duplicate_library_names_are_rejected() {
    let mut fixture = test_library();
    let err = fixture.project.load_library(&fixture.root, false);
    assert!(matches!(err, Err(ProjectError::DuplicateLibrary(_))));
}

#[test]
fn re_adding_a_document_is_a_negative_ack() {
    let mut fixture = test_library();
    let file = fixture.file("Constants.mo");
    let outcome = fixture.project.add_document(&file).unwrap();
    assert!(matches!(outcome, AddOutcome::AlreadyPresent(_)));
}

#[test]
fn add_document_lazily_under_library_root() {
    let mut fixture = test_library();
    let file = fixture.file("Late.mo");
    write_file(
        &file,
        "within TestLibrary;\nmodel Late\nend Late;\n",
    );
    assert!(fixture.project.get_document(&file).is_none());
    let outcome = fixture.project.add_document(&file).unwrap();
    assert!(matches!(outcome, AddOutcome::Added(_)));
    let document = fixture.project.get_document(&file).unwrap();
    assert_eq!(document.package_path(), ["TestLibrary", "Late"]);
}

#[test]
fn stray_file_with_within_clause_is_rejected() {
    let mut fixture = test_library();
    let stray = fixture.dir.path().join("elsewhere").join("Stray.mo");
    write_file(&stray, "within Somewhere.Else;\nmodel Stray\nend Stray;\n");
    let err = fixture.project.add_document(&stray);
    assert!(matches!(err, Err(ProjectError::NoMatchingLibrary(_))));
}

#[test]
fn stray_file_without_within_becomes_standalone_library() {
    let mut fixture = test_library();
    let scratch = fixture.dir.path().join("scratch").join("Scratch.mo");
    write_file(
        &scratch,
        "model Scratch\n  Real x;\nequation\n  x = 1;\nend Scratch;\n",
    );
    let outcome = fixture.project.add_document(&scratch).unwrap();
    assert!(matches!(outcome, AddOutcome::Added(_)));
    let library = fixture.project.library_by_name("scratch").unwrap();
    assert!(library.is_workspace());
    assert_eq!(library.document_count(), 1);

    // local resolution works inside the standalone file
    let position = position_in(
        "model Scratch\n  Real x;\nequation\n  x = 1;\nend Scratch;\n",
        "x = 1",
        0,
    );
    let location = mols::ide::find_declaration(&mut fixture.project, &scratch, position)
        .unwrap()
        .expect("x resolves inside the scratch file");
    assert_eq!(location.path, scratch);
    assert_eq!(location.symbols, vec!["scratch", "Scratch", "x"]);
}

#[test]
fn resolution_reloads_removed_documents_on_demand() {
    let mut fixture = test_library();
    let file = fixture.file("Constants.mo");
    assert!(fixture.project.remove_document(&file));
    assert!(fixture.project.get_document(&file).is_none());

    // the walk pulls the sibling file back in from disk
    let reference = mols::semantic::UnresolvedReference::Absolute(
        mols::semantic::AbsoluteReference::new(
            helpers::path(&["TestLibrary", "Constants", "e"]),
            None,
        )
        .unwrap(),
    );
    let resolved = mols::semantic::resolve_reference(
        &mut fixture.project,
        &reference,
        mols::semantic::Resolution::Declaration,
    )
    .unwrap();
    assert!(resolved.is_some());
    assert!(fixture.project.get_document(&file).is_some());
}

#[test]
fn update_document_requires_presence() {
    let mut fixture = test_library();
    let missing = fixture.file("Nope.mo");
    assert!(!fixture.project.update_document(&missing, "x", None));
    let present = fixture.file("Constants.mo");
    assert!(fixture
        .project
        .update_document(&present, helpers::CONSTANTS_MO, None));
}

#[test]
fn remove_document_detaches_it() {
    let mut fixture = test_library();
    let file = fixture.file("Constants.mo");
    assert!(fixture.project.remove_document(&file));
    assert!(fixture.project.get_document(&file).is_none());
    // removing again reports nothing removed
    assert!(!fixture.project.remove_document(&file));
}

#[test]
fn document_count_tracks_removals() {
    let mut fixture = test_library();
    let before = fixture.project.document_count();
    fixture.project.remove_document(&fixture.file("Constants.mo"));
    assert_eq!(fixture.project.document_count(), before - 1);
}
