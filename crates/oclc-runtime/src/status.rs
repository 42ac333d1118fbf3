//! OpenCL status codes and their symbolic names.

/// `CL_SUCCESS`
pub const SUCCESS: i32 = 0;
/// `CL_DEVICE_NOT_FOUND`
pub const DEVICE_NOT_FOUND: i32 = -1;
/// `CL_OUT_OF_HOST_MEMORY`
pub const OUT_OF_HOST_MEMORY: i32 = -6;
/// `CL_BUILD_PROGRAM_FAILURE`
pub const BUILD_PROGRAM_FAILURE: i32 = -11;
/// `CL_INVALID_VALUE`
pub const INVALID_VALUE: i32 = -30;
/// `CL_INVALID_PLATFORM`
pub const INVALID_PLATFORM: i32 = -32;
/// `CL_INVALID_DEVICE`
pub const INVALID_DEVICE: i32 = -33;
/// `CL_INVALID_CONTEXT`
pub const INVALID_CONTEXT: i32 = -34;
/// `CL_INVALID_COMMAND_QUEUE`
pub const INVALID_COMMAND_QUEUE: i32 = -36;
/// `CL_INVALID_MEM_OBJECT`
pub const INVALID_MEM_OBJECT: i32 = -38;
/// `CL_INVALID_BINARY`
pub const INVALID_BINARY: i32 = -42;
/// `CL_INVALID_BUILD_OPTIONS`
pub const INVALID_BUILD_OPTIONS: i32 = -43;
/// `CL_INVALID_PROGRAM_EXECUTABLE`
pub const INVALID_PROGRAM_EXECUTABLE: i32 = -45;
/// `CL_INVALID_KERNEL_NAME`
pub const INVALID_KERNEL_NAME: i32 = -46;
/// `CL_INVALID_ARG_INDEX`
pub const INVALID_ARG_INDEX: i32 = -49;
/// `CL_INVALID_ARG_VALUE`
pub const INVALID_ARG_VALUE: i32 = -50;
/// `CL_INVALID_ARG_SIZE`
pub const INVALID_ARG_SIZE: i32 = -51;
/// `CL_INVALID_KERNEL_ARGS`
pub const INVALID_KERNEL_ARGS: i32 = -52;
/// `CL_INVALID_BUFFER_SIZE`
pub const INVALID_BUFFER_SIZE: i32 = -61;

/// Name reported for codes missing from [`STATUS_TABLE`].
pub const UNKNOWN_STATUS: &str = "UNKNOWN_STATUS";

/// Status codes defined by OpenCL 1.2.
pub const STATUS_TABLE: &[(i32, &str)] = &[
    (0, "CL_SUCCESS"),
    (-1, "CL_DEVICE_NOT_FOUND"),
    (-2, "CL_DEVICE_NOT_AVAILABLE"),
    (-3, "CL_COMPILER_NOT_AVAILABLE"),
    (-4, "CL_MEM_OBJECT_ALLOCATION_FAILURE"),
    (-5, "CL_OUT_OF_RESOURCES"),
    (-6, "CL_OUT_OF_HOST_MEMORY"),
    (-7, "CL_PROFILING_INFO_NOT_AVAILABLE"),
    (-8, "CL_MEM_COPY_OVERLAP"),
    (-9, "CL_IMAGE_FORMAT_MISMATCH"),
    (-10, "CL_IMAGE_FORMAT_NOT_SUPPORTED"),
    (-11, "CL_BUILD_PROGRAM_FAILURE"),
    (-12, "CL_MAP_FAILURE"),
    (-13, "CL_MISALIGNED_SUB_BUFFER_OFFSET"),
    (-14, "CL_EXEC_STATUS_ERROR_FOR_EVENTS_IN_WAIT_LIST"),
    (-15, "CL_COMPILE_PROGRAM_FAILURE"),
    (-16, "CL_LINKER_NOT_AVAILABLE"),
    (-17, "CL_LINK_PROGRAM_FAILURE"),
    (-18, "CL_DEVICE_PARTITION_FAILED"),
    (-19, "CL_KERNEL_ARG_INFO_NOT_AVAILABLE"),
    (-30, "CL_INVALID_VALUE"),
    (-31, "CL_INVALID_DEVICE_TYPE"),
    (-32, "CL_INVALID_PLATFORM"),
    (-33, "CL_INVALID_DEVICE"),
    (-34, "CL_INVALID_CONTEXT"),
    (-35, "CL_INVALID_QUEUE_PROPERTIES"),
    (-36, "CL_INVALID_COMMAND_QUEUE"),
    (-37, "CL_INVALID_HOST_PTR"),
    (-38, "CL_INVALID_MEM_OBJECT"),
    (-39, "CL_INVALID_IMAGE_FORMAT_DESCRIPTOR"),
    (-40, "CL_INVALID_IMAGE_SIZE"),
    (-41, "CL_INVALID_SAMPLER"),
    (-42, "CL_INVALID_BINARY"),
    (-43, "CL_INVALID_BUILD_OPTIONS"),
    (-44, "CL_INVALID_PROGRAM"),
    (-45, "CL_INVALID_PROGRAM_EXECUTABLE"),
    (-46, "CL_INVALID_KERNEL_NAME"),
    (-47, "CL_INVALID_KERNEL_DEFINITION"),
    (-48, "CL_INVALID_KERNEL"),
    (-49, "CL_INVALID_ARG_INDEX"),
    (-50, "CL_INVALID_ARG_VALUE"),
    (-51, "CL_INVALID_ARG_SIZE"),
    (-52, "CL_INVALID_KERNEL_ARGS"),
    (-53, "CL_INVALID_WORK_DIMENSION"),
    (-54, "CL_INVALID_WORK_GROUP_SIZE"),
    (-55, "CL_INVALID_WORK_ITEM_SIZE"),
    (-56, "CL_INVALID_GLOBAL_OFFSET"),
    (-57, "CL_INVALID_EVENT_WAIT_LIST"),
    (-58, "CL_INVALID_EVENT"),
    (-59, "CL_INVALID_OPERATION"),
    (-60, "CL_INVALID_GL_OBJECT"),
    (-61, "CL_INVALID_BUFFER_SIZE"),
    (-62, "CL_INVALID_MIP_LEVEL"),
    (-63, "CL_INVALID_GLOBAL_WORK_SIZE"),
    (-64, "CL_INVALID_PROPERTY"),
    (-65, "CL_INVALID_IMAGE_DESCRIPTOR"),
    (-66, "CL_INVALID_COMPILER_OPTIONS"),
    (-67, "CL_INVALID_LINKER_OPTIONS"),
    (-68, "CL_INVALID_DEVICE_PARTITION_COUNT"),
];

/// Look up the symbolic name of a status code.
pub fn lookup(code: i32) -> Option<&'static str> {
    STATUS_TABLE
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Symbolic name of a status code, or [`UNKNOWN_STATUS`].
pub fn describe(code: i32) -> &'static str {
    lookup(code).unwrap_or(UNKNOWN_STATUS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        assert_eq!(describe(SUCCESS), "CL_SUCCESS");
        assert_eq!(describe(BUILD_PROGRAM_FAILURE), "CL_BUILD_PROGRAM_FAILURE");
        assert_eq!(describe(INVALID_BUILD_OPTIONS), "CL_INVALID_BUILD_OPTIONS");
    }

    #[test]
    fn unknown_code_falls_back() {
        assert_eq!(lookup(-1000), None);
        assert_eq!(describe(-1000), UNKNOWN_STATUS);
        // Gap between the runtime and the API error ranges.
        assert_eq!(lookup(-25), None);
    }

    #[test]
    fn table_has_no_duplicate_codes() {
        for (i, (code, _)) in STATUS_TABLE.iter().enumerate() {
            assert!(
                STATUS_TABLE[i + 1..].iter().all(|(c, _)| c != code),
                "duplicate status {code}"
            );
        }
    }

    #[test]
    fn named_constants_match_table() {
        for code in [
            DEVICE_NOT_FOUND,
            OUT_OF_HOST_MEMORY,
            INVALID_VALUE,
            INVALID_PLATFORM,
            INVALID_DEVICE,
            INVALID_CONTEXT,
            INVALID_COMMAND_QUEUE,
            INVALID_MEM_OBJECT,
            INVALID_BINARY,
            INVALID_PROGRAM_EXECUTABLE,
            INVALID_KERNEL_NAME,
            INVALID_ARG_INDEX,
            INVALID_ARG_VALUE,
            INVALID_KERNEL_ARGS,
            INVALID_BUFFER_SIZE,
        ] {
            assert!(lookup(code).is_some(), "missing status {code}");
        }
    }
}
