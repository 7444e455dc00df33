use imc_patchkit::config::PreprocessingConfig;
use imc_patchkit::image::ChannelImage;
use imc_patchkit::preprocess::steps::{
    ArcsinhDenoise, BackgroundSubtraction, HotPixelRemoval, MinMaxScale, Winsorize,
};
use imc_patchkit::preprocess::{apply_all, build_steps, PreprocessStep};

fn single_channel(height: usize, width: usize, data: Vec<f32>) -> ChannelImage {
    ChannelImage::new(vec!["Ir191".to_string()], height, width, data).unwrap()
}

#[test]
fn default_config_builds_the_full_ordered_chain() {
    let cfg = PreprocessingConfig::default();
    let steps = build_steps(&cfg);
    let names: Vec<&str> = steps.iter().map(|s| s.name()).collect();
    assert_eq!(
        names,
        vec![
            "hot_pixel_removal",
            "striping_removal",
            "denoising",
            "background_subtraction",
            "winsorization",
            "min_max_scaling",
        ]
    );
}

#[test]
fn disabled_toggles_drop_their_steps() {
    let mut cfg = PreprocessingConfig::default();
    cfg.toggles.apply_hot_pixel_removal = false;
    cfg.toggles.apply_winsorization = false;
    let names: Vec<&str> = build_steps(&cfg).iter().map(|s| s.name()).collect();
    assert_eq!(
        names,
        vec![
            "striping_removal",
            "denoising",
            "background_subtraction",
            "min_max_scaling",
        ]
    );
}

#[test]
fn isolated_hot_pixel_is_replaced_by_the_local_median() {
    let mut data = vec![1.0f32; 25];
    data[12] = 100.0;
    let mut image = single_channel(5, 5, data);
    let step = HotPixelRemoval {
        window_size: 3,
        z_score_threshold: 5.0,
    };
    step.apply(&mut image);
    assert_eq!(image.channel(0)[12], 1.0);
    assert!(image.channel(0).iter().all(|&v| v == 1.0));
}

#[test]
fn uniform_plane_survives_hot_pixel_removal_unchanged() {
    let mut image = single_channel(5, 5, vec![2.0; 25]);
    let step = HotPixelRemoval {
        window_size: 3,
        z_score_threshold: 5.0,
    };
    step.apply(&mut image);
    assert!(image.channel(0).iter().all(|&v| v == 2.0));
}

#[test]
fn arcsinh_uses_the_cofactor() {
    let mut image = single_channel(1, 3, vec![0.0, 5.0, 10.0]);
    let step = ArcsinhDenoise { cofactor: 5.0 };
    step.apply(&mut image);
    let plane = image.channel(0);
    assert_eq!(plane[0], 0.0);
    assert!((plane[1] - 1.0f32.asinh()).abs() < 1e-6);
    assert!((plane[2] - 2.0f32.asinh()).abs() < 1e-6);
}

#[test]
fn background_subtraction_clamps_at_zero() {
    let data: Vec<f32> = (0..100).map(|v| v as f32).collect();
    let mut image = single_channel(10, 10, data);
    let step = BackgroundSubtraction { percentile: 50.0 };
    step.apply(&mut image);
    let plane = image.channel(0);
    assert_eq!(plane[0], 0.0);
    assert_eq!(plane[10], 0.0);
    assert_eq!(plane[99], 49.0);
    assert!(plane.iter().all(|&v| v >= 0.0));
}

#[test]
fn winsorize_clips_the_upper_tail() {
    let data: Vec<f32> = (0..100).map(|v| v as f32).collect();
    let mut image = single_channel(10, 10, data);
    let step = Winsorize {
        lower: 0.0,
        upper: 0.1,
    };
    step.apply(&mut image);
    let plane = image.channel(0);
    assert_eq!(plane[0], 0.0);
    assert_eq!(plane[99], 89.0);
    assert!(plane.iter().all(|&v| v <= 89.0));
}

#[test]
fn min_max_scaling_maps_each_channel_to_unit_range() {
    let mut data = vec![0.0, 5.0, 10.0];
    data.extend([3.0, 3.0, 3.0]); // flat second channel
    let image = ChannelImage::new(
        vec!["Ir191".to_string(), "Ir193".to_string()],
        1,
        3,
        data,
    )
    .unwrap();
    let mut image = image;
    MinMaxScale.apply(&mut image);
    assert_eq!(image.channel(0), &[0.0, 0.5, 1.0]);
    // A flat channel has no range and maps to zero.
    assert_eq!(image.channel(1), &[0.0, 0.0, 0.0]);
}

#[test]
fn apply_all_runs_steps_in_sequence() {
    let mut image = single_channel(1, 3, vec![0.0, 5.0, 10.0]);
    let steps: Vec<Box<dyn PreprocessStep>> = vec![
        Box::new(ArcsinhDenoise { cofactor: 1.0 }),
        Box::new(MinMaxScale),
    ];
    apply_all(&steps, &mut image);
    let plane = image.channel(0);
    assert_eq!(plane[0], 0.0);
    assert_eq!(plane[2], 1.0);
    assert!(plane[1] > 0.5 && plane[1] < 1.0);
}
