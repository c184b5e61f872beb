//! Subject-centered crop engine for catalog product photos.
//!
//! Bounded contexts follow a domain/infrastructure split: `detection` finds
//! and selects the subject, `cropping` turns its box into the final frame,
//! `imaging` handles files, and `pipeline` wires them into use cases.

pub mod cropping {
    pub mod domain {
        pub mod aspect_corrector;
        pub mod border_trimmer;
        pub mod box_adjuster;
        pub mod crop_policy;
        pub mod focus_mode;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod detection_candidate;
        pub mod subject_detector;
        pub mod subject_selector;
    }
    pub mod infrastructure;
}

pub mod imaging {
    pub mod domain {
        pub mod image_reader;
        pub mod image_writer;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod batch_crop_use_case;
    pub mod batch_executor;
    pub mod batch_report;
    pub mod crop_engine;
    pub mod crop_image_use_case;
    pub mod pipeline_logger;
    pub mod skipped;
    pub mod infrastructure {
        pub mod threaded_batch_executor;
    }
}

pub mod shared {
    pub mod bounding_box;
    pub mod constants;
    pub mod frame;
    pub mod image_files;
}
